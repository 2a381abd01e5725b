// ==========================================
// Andon 生产监控看板 - 导入模块
// ==========================================
// 职责: production_progress CSV 导出 → ProductionEvent
// 使用方: import_events 工具 / EventLog 回放
// ==========================================

pub mod error;
pub mod progress_csv;

pub use error::{ImportError, ImportResult};
pub use progress_csv::{load_events, read_events};
