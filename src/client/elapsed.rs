// ==========================================
// Andon 生产监控看板 - 计时显示
// ==========================================
// 每秒按 now - since 重新计算，与轮询周期无关
// 暂停子状态（Tunggu ...）下冻结在进入暂停时的数值
// ==========================================

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::domain::progress::WorkstationSnapshot;
use crate::domain::types::StageSignal;
use crate::engine::estimate::{self, DurationUnits};

// ==========================================
// ElapsedTicker - 单项计时
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ElapsedTicker {
    since: Option<NaiveDateTime>,
    paused: bool,
    frozen: Option<i64>,
}

impl ElapsedTicker {
    pub fn new(since: Option<NaiveDateTime>, signal: Option<&StageSignal>) -> Self {
        Self {
            since,
            paused: signal.map(StageSignal::is_paused).unwrap_or(false),
            frozen: None,
        }
    }

    /// 应用新的快照数据
    ///
    /// 起点变化或离开暂停状态时重新开始计时
    pub fn update(&mut self, since: Option<NaiveDateTime>, signal: Option<&StageSignal>) {
        let paused = signal.map(StageSignal::is_paused).unwrap_or(false);
        if since != self.since || !paused {
            self.frozen = None;
        }
        self.since = since;
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 当前计时秒数（未知起点或起点在未来时为 None）
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<i64> {
        if self.paused {
            if self.frozen.is_none() {
                self.frozen = estimate::elapsed_seconds(self.since, now);
            }
            return self.frozen;
        }
        estimate::elapsed_seconds(self.since, now)
    }

    /// 计时文本，未知时为 "—"
    pub fn display(&mut self, now: NaiveDateTime, units: &DurationUnits) -> String {
        estimate::format_duration_with(self.tick(now), units)
    }
}

// ==========================================
// ElapsedBoard - 工位计时集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ElapsedBoard {
    tickers: BTreeMap<i32, ElapsedTicker>,
}

impl ElapsedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按最新工位快照同步（未占用工位移除计时）
    pub fn sync(&mut self, workstations: &[WorkstationSnapshot]) {
        self.tickers.retain(|ws, _| {
            workstations
                .iter()
                .any(|s| s.workstation == *ws && s.occupied)
        });

        for snapshot in workstations.iter().filter(|s| s.occupied) {
            let signal = snapshot.signal.as_ref();
            self.tickers
                .entry(snapshot.workstation)
                .and_modify(|t| t.update(snapshot.started_at, signal))
                .or_insert_with(|| ElapsedTicker::new(snapshot.started_at, signal));
        }
    }

    /// 所有工位的计时文本（按工位号升序）
    pub fn tick(&mut self, now: NaiveDateTime, units: &DurationUnits) -> Vec<(i32, String)> {
        self.tickers
            .iter_mut()
            .map(|(ws, ticker)| (*ws, ticker.display(now, units)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
