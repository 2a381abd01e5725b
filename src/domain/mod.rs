// ==========================================
// Andon 生产监控看板 - 领域层
// ==========================================
// 职责: 事件、派生视图与状态信号类型
// ==========================================

pub mod progress;
pub mod types;

pub use progress::{
    CurrentWorkstationProgress, IdealTime, LifecycleBoard, LifecycleRow, OperatorActivity,
    ProductLifecycleCard, ProductionEstimate, ProductionEvent, ProductionStats, ProgressFilter,
    ScheduledUnit, StatsScope, StatusSummary, SummaryRow, ToDoEntry, WorkstationDuration,
    WorkstationSnapshot, WorkstationStats,
};
pub use types::{
    DaysBack, LifecycleBucket, ReportWindow, StageSignal, StatusTone, SummaryCountMode,
    WaitingKind,
};
