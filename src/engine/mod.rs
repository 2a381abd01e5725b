// ==========================================
// Andon 生产监控看板 - 引擎层
// ==========================================
// 职责: 状态归约、预计完工、内存事件日志
// 红线: Engine 不拼 SQL
// ==========================================

pub mod estimate;
pub mod event_log;
pub mod status_reducer;

// 重导出核心引擎
pub use estimate::{
    estimate_finish, format_duration, format_duration_text, parse_duration_seconds,
    DurationUnits, PLACEHOLDER,
};
pub use event_log::EventLog;
pub use status_reducer::{build_board, bucket_for, lifecycle_cards, summarize, workstation_snapshots};
