// ==========================================
// Andon 生产监控看板 - 状态归约引擎
// ==========================================
// 职责: 原始事件 → 工位快照 / 生命周期卡片 / 状态计数 / 看板分栏
// 红线: 纯函数，不访问数据库，不持有状态
// 排序规则: 最新事件 = max(start_actual, id_process)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::domain::progress::{
    CurrentWorkstationProgress, LifecycleBoard, LifecycleRow, ProductLifecycleCard,
    ProductionEvent, ScheduledUnit, StatusSummary, SummaryRow, ToDoEntry, WorkstationSnapshot,
};
use crate::domain::types::{LifecycleBucket, StageSignal, StatusTone, SummaryCountMode};
use crate::engine::estimate::{self, DurationUnits};

/// QC 结论: 合格
pub const QC_FINISH_GOOD: &str = "Finish Good";
/// QC 结论: 不合格
pub const QC_NOT_OK: &str = "Not OK";

// ==========================================
// 按键取最新事件
// ==========================================

/// 按 key 分组，每组取最新事件
///
/// # 参数
/// - `events`: 事件序列（任意顺序）
/// - `key`: 分组键，返回 None 的事件被忽略
///
/// # 返回
/// - key → 该组 recency_key 最大的事件
pub fn latest_by<'a, K, I, F>(events: I, key: F) -> HashMap<K, &'a ProductionEvent>
where
    K: Eq + Hash,
    I: IntoIterator<Item = &'a ProductionEvent>,
    F: Fn(&ProductionEvent) -> Option<K>,
{
    let mut latest: HashMap<K, &'a ProductionEvent> = HashMap::new();
    for event in events {
        let Some(k) = key(event) else { continue };
        latest
            .entry(k)
            .and_modify(|current| {
                if event.recency_key() > current.recency_key() {
                    *current = event;
                }
            })
            .or_insert(event);
    }
    latest
}

/// 当日每个工位的最新事件（按工位号升序）
///
/// 只看 `today` 当天开始的事件，与回看天数无关
pub fn latest_event_per_workstation(
    events: &[ProductionEvent],
    today: NaiveDate,
) -> Vec<&ProductionEvent> {
    let todays = events
        .iter()
        .filter(|e| e.started_at.map(|t| t.date()) == Some(today));
    let mut latest: Vec<&ProductionEvent> = latest_by(todays, |e| e.workstation)
        .into_values()
        .collect();
    latest.sort_by_key(|e| e.workstation);
    latest
}

// ==========================================
// 工位快照
// ==========================================

/// 生成固定工位集合的快照
///
/// 当日无事件的工位输出 occupied=false 的空快照；
/// 不在固定集合中的工位被忽略
pub fn workstation_snapshots(
    current: &[CurrentWorkstationProgress],
    workstations: &[i32],
    now: NaiveDateTime,
    units: &DurationUnits,
) -> Vec<WorkstationSnapshot> {
    let by_ws: HashMap<i32, &CurrentWorkstationProgress> =
        current.iter().map(|c| (c.workstation, c)).collect();

    workstations
        .iter()
        .map(|ws| match by_ws.get(ws) {
            Some(progress) => occupied_snapshot(progress, now, units),
            None => empty_snapshot(*ws),
        })
        .collect()
}

fn occupied_snapshot(
    progress: &CurrentWorkstationProgress,
    now: NaiveDateTime,
    units: &DurationUnits,
) -> WorkstationSnapshot {
    let event = &progress.event;
    let end = event.finished_at.unwrap_or(now);
    let elapsed = estimate::elapsed_seconds(event.started_at, end);

    WorkstationSnapshot {
        workstation: progress.workstation,
        occupied: true,
        unit_id: event.unit_id.clone(),
        product_id: event.product_id.clone(),
        product_name: event.product_name.clone(),
        operator_name: event.operator_name.clone(),
        started_at: event.started_at,
        status: event.status.clone(),
        signal: Some(event.signal.clone()),
        tone: event.signal.tone(),
        paused: event.signal.is_paused(),
        elapsed_seconds: elapsed,
        elapsed_display: estimate::format_duration_with(elapsed, units),
        target_duration: progress.target_duration.clone(),
        target_percentage: progress.target_percentage,
    }
}

fn empty_snapshot(workstation: i32) -> WorkstationSnapshot {
    WorkstationSnapshot {
        workstation,
        occupied: false,
        unit_id: None,
        product_id: None,
        product_name: None,
        operator_name: None,
        started_at: None,
        status: None,
        signal: None,
        tone: StatusTone::Neutral,
        paused: false,
        elapsed_seconds: None,
        elapsed_display: estimate::PLACEHOLDER.to_string(),
        target_duration: None,
        target_percentage: None,
    }
}

// ==========================================
// 生命周期卡片
// ==========================================

/// 原始行 → 卡片（按代表事件开始时间倒序）
pub fn lifecycle_cards(rows: Vec<LifecycleRow>) -> Vec<ProductLifecycleCard> {
    let mut cards: Vec<ProductLifecycleCard> = rows.into_iter().filter_map(build_card).collect();
    cards.sort_by(|a, b| {
        b.latest_started_at
            .cmp(&a.latest_started_at)
            .then_with(|| a.unit_id.cmp(&b.unit_id))
    });
    cards
}

/// 单行 → 卡片；缺少 unit_id 的行无法成卡
pub fn build_card(row: LifecycleRow) -> Option<ProductLifecycleCard> {
    let LifecycleRow {
        event,
        first_station_start,
        ideal_duration,
    } = row;
    let unit_id = event.unit_id.clone()?;

    let estimated_finish = estimate::estimate_finish(first_station_start, ideal_duration.as_deref());
    let is_completed = event.finished_at.is_some();
    let is_finish_good = qc_equals(event.qc_note.as_deref(), QC_FINISH_GOOD);
    let overtime_seconds = if is_completed {
        estimate::overtime_seconds(event.finished_at, estimated_finish)
    } else {
        None
    };

    Some(ProductLifecycleCard {
        unit_id,
        product_id: event.product_id,
        product_name: event.product_name,
        operator_name: event.operator_name,
        current_workstation: event.workstation,
        status: event.status,
        signal: event.signal,
        latest_started_at: event.started_at,
        first_station_start,
        finished_at: event.finished_at,
        total_duration: ideal_duration,
        estimated_finish,
        overtime_seconds,
        qc_note: event.qc_note,
        is_completed,
        is_finish_good,
    })
}

fn qc_equals(note: Option<&str>, expected: &str) -> bool {
    note.map(str::trim) == Some(expected)
}

// ==========================================
// 状态计数
// ==========================================

/// 窗口内事件 → 全厂状态计数
///
/// - selesai_produksi / on_progress / finish_good / not_ok: 按单件去重
/// - gangguan / tunggu: 按 `mode` 计数（默认事件数，不去重）
///
/// 每行只归入一个信号（按 `StageSignal::classify` 的优先级），与逐项 LIKE 统计不同:
/// 如 "Masuk WS2 Gangguan" 只计入 gangguan，不再计入 on_progress
pub fn summarize(rows: &[SummaryRow], mode: SummaryCountMode) -> StatusSummary {
    let mut exited: HashSet<&str> = HashSet::new();
    let mut entered: HashSet<&str> = HashSet::new();
    let mut finish_good: HashSet<&str> = HashSet::new();
    let mut not_ok: HashSet<&str> = HashSet::new();
    let mut disrupted_units: HashSet<&str> = HashSet::new();
    let mut waiting_units: HashSet<&str> = HashSet::new();
    let mut disrupted_events = 0u64;
    let mut waiting_events = 0u64;

    for row in rows {
        let unit = row.unit_id.as_deref();
        match &row.signal {
            StageSignal::Exited { .. } => insert_unit(&mut exited, unit),
            StageSignal::Entered { .. } => insert_unit(&mut entered, unit),
            StageSignal::FinishGood => insert_unit(&mut finish_good, unit),
            StageSignal::NotOk => insert_unit(&mut not_ok, unit),
            StageSignal::Disrupted => {
                disrupted_events += 1;
                insert_unit(&mut disrupted_units, unit);
            }
            StageSignal::Waiting { .. } => {
                waiting_events += 1;
                insert_unit(&mut waiting_units, unit);
            }
            StageSignal::Shortage | StageSignal::Unknown { .. } => {}
        }
    }

    let (gangguan, tunggu) = match mode {
        SummaryCountMode::Events => (disrupted_events, waiting_events),
        SummaryCountMode::Units => (disrupted_units.len() as u64, waiting_units.len() as u64),
    };

    StatusSummary {
        selesai_produksi: exited.len() as u64,
        on_progress: entered.len() as u64,
        finish_good: finish_good.len() as u64,
        not_ok: not_ok.len() as u64,
        gangguan,
        tunggu,
    }
}

// COUNT(DISTINCT ...) 不计 NULL
fn insert_unit<'a>(set: &mut HashSet<&'a str>, unit: Option<&'a str>) {
    if let Some(u) = unit {
        set.insert(u);
    }
}

// ==========================================
// 看板分栏
// ==========================================

/// 卡片分栏规则
///
/// - 未完成且无任何开工记录 → To Do
/// - 未完成 → On Progress
/// - 已完成且 QC = "Finish Good" → Finish Good
/// - 已完成且 QC = "Not OK" → Not OK
/// - 其他已完成 → QC（待检）
pub fn bucket_for(card: &ProductLifecycleCard) -> LifecycleBucket {
    if !card.is_completed {
        if card.latest_started_at.is_none() && card.first_station_start.is_none() {
            LifecycleBucket::ToDo
        } else {
            LifecycleBucket::OnProgress
        }
    } else if card.is_finish_good {
        LifecycleBucket::FinishGood
    } else if qc_equals(card.qc_note.as_deref(), QC_NOT_OK) {
        LifecycleBucket::NotOk
    } else {
        LifecycleBucket::Qc
    }
}

/// 卡片 + 排产计划 → 看板
pub fn build_board(
    cards: &[ProductLifecycleCard],
    schedule: &[ScheduledUnit],
) -> LifecycleBoard {
    let mut board = LifecycleBoard::default();

    for card in cards {
        match bucket_for(card) {
            LifecycleBucket::ToDo => board.to_do.push(ToDoEntry::Card(card.clone())),
            LifecycleBucket::OnProgress => board.on_progress.push(card.clone()),
            LifecycleBucket::Qc => board.qc.push(card.clone()),
            LifecycleBucket::FinishGood => board.finish_good.push(card.clone()),
            LifecycleBucket::NotOk => board.not_ok.push(card.clone()),
        }
    }

    board
        .to_do
        .extend(schedule.iter().cloned().map(ToDoEntry::Scheduled));
    board
}

// ==========================================
// 异常推送
// ==========================================

/// 异常事件（Gangguan / Kurang Komponen），最新在前
pub fn abnormal_events(events: Vec<ProductionEvent>) -> Vec<ProductionEvent> {
    newest_first(events.into_iter().filter(|e| e.signal.is_abnormal()).collect())
}

/// 缺料事件（Kurang Komponen），最新在前
pub fn shortage_events(events: Vec<ProductionEvent>) -> Vec<ProductionEvent> {
    newest_first(
        events
            .into_iter()
            .filter(|e| e.signal == StageSignal::Shortage)
            .collect(),
    )
}

fn newest_first(mut events: Vec<ProductionEvent>) -> Vec<ProductionEvent> {
    events.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
    events
}
