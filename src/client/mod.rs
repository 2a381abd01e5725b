// ==========================================
// Andon 生产监控看板 - 轮询客户端
// ==========================================
// 职责: 定时拉取看板聚合，维护客户端视图状态与计时显示
// ==========================================

pub mod elapsed;
pub mod error;
pub mod poller;
pub mod scheduler;
pub mod transport;

// 重导出
pub use elapsed::{ElapsedBoard, ElapsedTicker};
pub use error::{ClientError, ClientResult};
pub use poller::{PollingClient, RefreshGuard, RefreshOutcome, ViewState};
pub use scheduler::{ViewScheduler, DEFAULT_TICK_INTERVAL};
pub use transport::{DashboardSource, HttpDashboardSource};
