// ==========================================
// Andon 生产监控看板 - API 响应对象
// ==========================================
// 顶层字段 camelCase（与看板前端约定一致）
// 嵌套领域对象沿用领域层字段名
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::progress::{
    CurrentWorkstationProgress, LifecycleBoard, OperatorActivity, ProductLifecycleCard,
    ProductionEstimate, ProductionEvent, ProductionStats, ScheduledUnit, StatusSummary,
    WorkstationDuration, WorkstationSnapshot, WorkstationStats,
};
use crate::domain::types::DaysBack;

// ==========================================
// DashboardSnapshot - 看板聚合
// ==========================================
// GET /api/production-progress/current
// 查询失败的字段为空数组 / 零值，失败的查询名记录在 degraded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub stats: ProductionStats,
    pub workstations: Vec<WorkstationSnapshot>,
    pub recent: Vec<ProductionEvent>,
    pub current: Vec<CurrentWorkstationProgress>,
    pub durations: Vec<WorkstationDuration>,
    pub estimate: Option<ProductionEstimate>,
    pub cards: Vec<ProductLifecycleCard>,
    pub status_summary: StatusSummary,
    pub operators: Vec<OperatorActivity>,
    pub abnormal: Vec<ProductionEvent>,
    pub schedule: Vec<ScheduledUnit>,
    pub days_back: DaysBack,
    pub updated_at: NaiveDateTime,
    pub board: LifecycleBoard,
    #[serde(default)]
    pub degraded: Vec<String>,
}

impl DashboardSnapshot {
    /// 全空快照（所有查询失败或尚未加载）
    pub fn empty(days_back: DaysBack, updated_at: NaiveDateTime) -> Self {
        Self {
            stats: ProductionStats::default(),
            workstations: Vec::new(),
            recent: Vec::new(),
            current: Vec::new(),
            durations: Vec::new(),
            estimate: None,
            cards: Vec::new(),
            status_summary: StatusSummary::default(),
            operators: Vec::new(),
            abnormal: Vec::new(),
            schedule: Vec::new(),
            days_back,
            updated_at,
            board: LifecycleBoard::default(),
            degraded: Vec::new(),
        }
    }
}

// ==========================================
// ProgressList - 进度列表
// ==========================================
// GET /api/production-progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressList {
    pub stats: ProductionStats,
    pub workstations: Vec<WorkstationStats>,
    pub recent: Vec<ProductionEvent>,
}

// ==========================================
// ShortageFeed - 缺料通知
// ==========================================
// GET /api/notifications/kurang-komponen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageFeed {
    pub count: usize,
    pub notifications: Vec<ShortageNotification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortageNotification {
    pub id: String,
    pub operator_name: String,
    pub note: String,
    pub product_name: String,
    pub serial_number: String,
    pub timestamp: Option<NaiveDateTime>,
}
