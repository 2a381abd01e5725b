// ==========================================
// Andon 生产监控看板 - 核心库
// ==========================================
// 技术栈: axum + tokio + Rust + SQLite
// 系统定位: 只读监控服务（事件由产线终端写入）
// 分层: domain → repository → engine → api → app / client
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "id");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 事件与派生视图
pub mod domain;

// 数据仓储层 - 读模型
pub mod repository;

// 引擎层 - 状态归约 / 预计完工 / 内存事件日志
pub mod engine;

// 导入层 - CSV 事件导出
pub mod importer;

// 配置层 - 环境变量 + config_kv
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// SQL 统计
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 看板聚合
pub mod api;

// 应用层 - HTTP 服务
pub mod app;

// 轮询客户端
pub mod client;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DaysBack, LifecycleBucket, StageSignal, StatusTone, SummaryCountMode};

// 领域实体
pub use domain::{
    LifecycleBoard, ProductLifecycleCard, ProductionEvent, StatusSummary, WorkstationSnapshot,
};

// 引擎
pub use engine::EventLog;

// API
pub use api::{ApiError, DashboardSnapshot, ProgressApi};

// 仓储
pub use repository::{ProgressReadModel, ProgressRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Andon 生产监控看板";
