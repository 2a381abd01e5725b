// ==========================================
// Andon 生产监控看板 - 领域类型定义
// ==========================================
// 状态信号: 状态文本只在读取时分类一次，下游只匹配枚举
// 时间窗口: daysBack 统一收敛到 1..=365
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 等待类型 (Waiting Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitingKind {
    Start,  // Tunggu Mulai
    Finish, // Tunggu Selesai
    Other,  // 其他 Tunggu...
}

// ==========================================
// 工序状态信号 (Stage Signal)
// ==========================================
// 来源: production_progress.status 自由文本
// 分类优先级与看板颜色映射一致: Gangguan → Tunggu → Kurang Komponen → QC 结论 → 进出工位
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSignal {
    /// Masuk WS{n}
    Entered { workstation: Option<i32> },
    /// Selesai WS{n}
    Exited { workstation: Option<i32> },
    /// Tunggu ...
    Waiting { waiting: WaitingKind },
    /// Gangguan ...
    Disrupted,
    /// Kurang Komponen
    Shortage,
    /// Finish Good
    FinishGood,
    /// Not OK
    NotOk,
    /// 无法识别（含空状态）
    Unknown { raw: String },
}

impl StageSignal {
    /// 状态文本分类（唯一入口）
    pub fn classify(status: Option<&str>) -> Self {
        let raw = match status {
            Some(s) => s.trim(),
            None => return StageSignal::Unknown { raw: String::new() },
        };
        let lower = raw.to_lowercase();

        if lower.contains("gangguan") {
            return StageSignal::Disrupted;
        }
        if lower.contains("tunggu") {
            let waiting = if lower.contains("mulai") {
                WaitingKind::Start
            } else if lower.contains("selesai") {
                WaitingKind::Finish
            } else {
                WaitingKind::Other
            };
            return StageSignal::Waiting { waiting };
        }
        if lower.contains("kurang komponen") {
            return StageSignal::Shortage;
        }
        if lower == "finish good" {
            return StageSignal::FinishGood;
        }
        if lower == "not ok" {
            return StageSignal::NotOk;
        }
        if let Some(rest) = lower.strip_prefix("masuk ws") {
            return StageSignal::Entered {
                workstation: parse_leading_number(rest),
            };
        }
        if let Some(rest) = lower.strip_prefix("selesai ws") {
            return StageSignal::Exited {
                workstation: parse_leading_number(rest),
            };
        }

        StageSignal::Unknown {
            raw: raw.to_string(),
        }
    }

    /// 暂停子状态：计时显示冻结
    pub fn is_paused(&self) -> bool {
        matches!(self, StageSignal::Waiting { .. })
    }

    /// 异常类（进入异常推送）
    pub fn is_abnormal(&self) -> bool {
        matches!(self, StageSignal::Disrupted | StageSignal::Shortage)
    }

    /// 看板颜色
    pub fn tone(&self) -> StatusTone {
        match self {
            StageSignal::Disrupted => StatusTone::Disrupted,
            StageSignal::Waiting { .. } => StatusTone::Waiting,
            StageSignal::Entered { .. } => StatusTone::Running,
            _ => StatusTone::Neutral,
        }
    }
}

fn parse_leading_number(s: &str) -> Option<i32> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ==========================================
// 看板颜色 (Status Tone)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTone {
    Disrupted, // 红色闪烁
    Waiting,   // 琥珀色闪烁
    Running,   // 绿色
    Neutral,   // 灰色
}

impl StatusTone {
    pub fn blinks(&self) -> bool {
        matches!(self, StatusTone::Disrupted | StatusTone::Waiting)
    }
}

// ==========================================
// 看板分栏 (Lifecycle Bucket)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleBucket {
    ToDo,
    OnProgress,
    Qc,
    FinishGood,
    NotOk,
}

impl fmt::Display for LifecycleBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleBucket::ToDo => write!(f, "TO_DO"),
            LifecycleBucket::OnProgress => write!(f, "ON_PROGRESS"),
            LifecycleBucket::Qc => write!(f, "QC"),
            LifecycleBucket::FinishGood => write!(f, "FINISH_GOOD"),
            LifecycleBucket::NotOk => write!(f, "NOT_OK"),
        }
    }
}

// ==========================================
// Gangguan/Tunggu 计数口径
// ==========================================
// Events: 每条匹配事件都计数（同一件产品多次触发计多次）
// Units:  按 id_perproduct 去重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryCountMode {
    #[default]
    Events,
    Units,
}

impl SummaryCountMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "events" | "event" => Some(SummaryCountMode::Events),
            "units" | "unit" => Some(SummaryCountMode::Units),
            _ => None,
        }
    }
}

// ==========================================
// 回看天数 (daysBack)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaysBack(u32);

impl DaysBack {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 365;

    /// 前端下拉选项
    pub const SELECTOR_OPTIONS: [u32; 7] = [1, 3, 7, 14, 30, 90, 365];

    /// 超出范围的值收敛到边界
    pub fn clamped(days: i64) -> Self {
        DaysBack(days.clamp(Self::MIN as i64, Self::MAX as i64) as u32)
    }

    /// 仅接受下拉选项中的值
    pub fn from_selector(days: u32) -> Option<Self> {
        Self::SELECTOR_OPTIONS
            .contains(&days)
            .then_some(DaysBack(days))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for DaysBack {
    fn default() -> Self {
        DaysBack(7)
    }
}

impl fmt::Display for DaysBack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 报表窗口 (Report Window)
// ==========================================
// now 由调用方注入，便于测试固定"今天"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub now: NaiveDateTime,
    pub days_back: DaysBack,
}

impl ReportWindow {
    pub fn new(now: NaiveDateTime, days_back: DaysBack) -> Self {
        Self { now, days_back }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    /// 按日期截断的窗口起点: DATE(start_actual) >= today - N
    pub fn since_date(&self) -> NaiveDate {
        self.today() - Duration::days(self.days_back.get() as i64)
    }

    /// 按时间戳的窗口起点: start_actual >= now - N 天
    pub fn since_instant(&self) -> NaiveDateTime {
        self.now - Duration::days(self.days_back.get() as i64)
    }
}
