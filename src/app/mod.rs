// ==========================================
// Andon 生产监控看板 - 应用层
// ==========================================
// 职责: 组装应用状态，暴露 HTTP 路由
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::build_router;
pub use state::{get_default_db_path, AppState, StoreKind};
