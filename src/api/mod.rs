// ==========================================
// Andon 生产监控看板 - API 层
// ==========================================
// 职责: 提供看板聚合接口，供 HTTP 路由调用
// ==========================================

pub mod dto;
pub mod error;
pub mod progress_api;

// 重导出核心类型
pub use dto::{DashboardSnapshot, ProgressList, ShortageFeed, ShortageNotification};
pub use error::{ApiError, ApiResult};
pub use progress_api::ProgressApi;
