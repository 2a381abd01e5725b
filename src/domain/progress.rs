// ==========================================
// Andon 生产监控看板 - 生产进度领域模型
// ==========================================
// 事件源: production_progress 表（只读，写入方为产线终端）
// 派生视图: 每次请求重新计算，不落库
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{StageSignal, StatusTone};

// ==========================================
// ProductionEvent - 生产事件（production_progress 一行）
// ==========================================
// 对齐: production_progress 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub id_process: i64,                      // 自增主键（同时间戳的插入顺序）
    pub product_id: Option<String>,           // id_product 产品型号
    pub unit_id: Option<String>,              // id_perproduct 单件编号
    pub project_name: Option<String>,
    pub product_name: Option<String>,
    pub line: Option<String>,
    pub workshop: Option<String>,
    pub process_name: Option<String>,
    pub workstation: Option<i32>,
    pub operator_rfid: Option<i64>,
    pub operator_name: Option<String>,
    pub started_at: Option<NaiveDateTime>,    // start_actual
    pub finished_at: Option<NaiveDateTime>,   // finish_actual，None 表示仍在进行
    pub duration_seconds: Option<i64>,        // duration_sec_actual
    pub duration_formatted: Option<String>,   // duration_time_actual (HH:MM:SS)
    pub status: Option<String>,
    pub qc_note: Option<String>,              // note_qc，仅终检阶段
    pub signal: StageSignal,                  // 读取时由 status 分类
}

impl ProductionEvent {
    /// 按 status 重新计算 signal
    pub fn classified(mut self) -> Self {
        self.signal = StageSignal::classify(self.status.as_deref());
        self
    }

    /// 最新事件排序键: (start_actual, id_process)
    pub fn recency_key(&self) -> (Option<NaiveDateTime>, i64) {
        (self.started_at, self.id_process)
    }
}

// ==========================================
// IdealTime - 理想工时（ideal_time 一行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealTime {
    pub product_id: String,
    pub process_name: Option<String>,
    pub workstation: Option<i32>,
    pub duration_time: Option<String>, // HH:MM:SS
    pub percentage: Option<f64>,
}

// ==========================================
// CurrentWorkstationProgress - 工位当日最新事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWorkstationProgress {
    pub workstation: i32,
    pub event: ProductionEvent,
    pub target_duration: Option<String>, // ideal_time.duration_time（按工位）
    pub target_percentage: Option<f64>,  // ideal_time.percentage（按工位）
}

// ==========================================
// WorkstationSnapshot - 工位快照（派生，不持久化）
// ==========================================
// 固定工位集合中每个工位一条；当日无事件时 occupied=false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationSnapshot {
    pub workstation: i32,
    pub occupied: bool,
    pub unit_id: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub operator_name: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub signal: Option<StageSignal>,
    pub tone: StatusTone,
    pub paused: bool,
    pub elapsed_seconds: Option<i64>,
    pub elapsed_display: String,
    pub target_duration: Option<String>,
    pub target_percentage: Option<f64>,
}

// ==========================================
// ProductLifecycleCard - 单件生命周期卡片
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLifecycleCard {
    pub unit_id: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub operator_name: Option<String>,
    pub current_workstation: Option<i32>,
    pub status: Option<String>,
    pub signal: StageSignal,
    pub latest_started_at: Option<NaiveDateTime>,  // 代表事件的 start_actual
    pub first_station_start: Option<NaiveDateTime>, // WS1 最早开始
    pub finished_at: Option<NaiveDateTime>,         // 代表事件的 finish_actual
    pub total_duration: Option<String>,             // 理想总工时
    pub estimated_finish: Option<NaiveDateTime>,
    pub overtime_seconds: Option<i64>,
    pub qc_note: Option<String>,
    pub is_completed: bool,
    pub is_finish_good: bool,
}

// ==========================================
// StatusSummary - 全厂状态计数
// ==========================================
// gangguan / tunggu 默认按事件计数（见 SummaryCountMode）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub selesai_produksi: u64,
    pub on_progress: u64,
    pub finish_good: u64,
    pub not_ok: u64,
    pub gangguan: u64,
    pub tunggu: u64,
}

// ==========================================
// ProductionStats - 进度总览
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionStats {
    pub total_processes: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
    pub avg_duration_sec: f64,
    pub total_duration_sec: i64,
}

/// 进度总览范围
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsScope {
    pub workshop: Option<String>,
    pub line: Option<String>,
}

// ==========================================
// WorkstationStats - 工位统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkstationStats {
    pub workstation: i32,
    pub total_processes: u64,
    pub completed: u64,
    pub avg_duration_sec: f64,
    pub active_operator: Option<String>,
    pub product_name: Option<String>,
    pub unit_id: Option<String>,
}

// ==========================================
// WorkstationDuration - 当日工位实际用时
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationDuration {
    pub workstation: i32,
    pub actual_duration: Option<String>,
}

// ==========================================
// ProductionEstimate - 当前产品预计完工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEstimate {
    pub product_id: Option<String>,
    pub unit_id: Option<String>,
    pub product_name: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub total_duration: Option<String>,
    pub estimated_finish: Option<NaiveDateTime>,
}

// ==========================================
// OperatorActivity - 当日操作工活动
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorActivity {
    pub operator_rfid: Option<i64>,
    pub operator_name: String,
    pub events_today: u64,
    pub completed_today: u64,
    pub total_duration_sec: i64,
    pub last_seen_at: Option<NaiveDateTime>,
    pub current_workstation: Option<i32>,
}

// ==========================================
// ScheduledUnit - 排产计划（未开工）
// ==========================================
// 对齐: production_schedule 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledUnit {
    pub id: i64,
    pub project_id: Option<String>,
    pub product_id: Option<String>,
    pub project: Option<String>,
    pub product: Option<String>,
    pub workshop: Option<String>,
    pub line: Option<String>,
    pub quantity: Option<i64>,
    pub start_schedule: Option<NaiveDateTime>,
    pub finish_schedule: Option<NaiveDateTime>,
    pub qc_schedule: Option<NaiveDateTime>,
    pub progress_note: Option<String>,
}

// ==========================================
// ProgressFilter - 进度列表过滤
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFilter {
    pub workshop: Option<String>,
    pub line: Option<String>,
    pub search: Option<String>,
    pub limit: usize,
}

impl ProgressFilter {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 200;
    /// 模糊搜索最多返回条数（再按 limit 截断）
    pub const SEARCH_CAP: usize = 100;

    /// limit 收敛到 1..=200，缺省 20
    pub fn clamp_limit(limit: Option<i64>) -> usize {
        match limit {
            Some(v) => v.clamp(1, Self::MAX_LIMIT as i64) as usize,
            None => Self::DEFAULT_LIMIT,
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

// ==========================================
// LifecycleRow - 生命周期卡片原始行
// ==========================================
// 读模型返回；预计完工/超时由 status_reducer 计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRow {
    pub event: ProductionEvent,                     // 代表事件（该单件最新事件）
    pub first_station_start: Option<NaiveDateTime>, // WS1 最早开始
    pub ideal_duration: Option<String>,             // 理想总工时 HH:MM:SS
}

/// 状态计数原始行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub unit_id: Option<String>,
    pub signal: StageSignal,
}

// ==========================================
// LifecycleBoard - 看板分栏结果
// ==========================================
// 每张卡片只落入一个分栏
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleBoard {
    pub to_do: Vec<ToDoEntry>,
    pub on_progress: Vec<ProductLifecycleCard>,
    pub qc: Vec<ProductLifecycleCard>,
    pub finish_good: Vec<ProductLifecycleCard>,
    pub not_ok: Vec<ProductLifecycleCard>,
}

impl LifecycleBoard {
    /// 分栏内卡片总数（不含排产计划行）
    pub fn card_count(&self) -> usize {
        self.to_do
            .iter()
            .filter(|e| matches!(e, ToDoEntry::Card(_)))
            .count()
            + self.on_progress.len()
            + self.qc.len()
            + self.finish_good.len()
            + self.not_ok.len()
    }
}

/// To Do 分栏条目: 已有卡片但未开工，或排产计划中尚无事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ToDoEntry {
    Card(ProductLifecycleCard),
    Scheduled(ScheduledUnit),
}
