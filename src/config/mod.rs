// ==========================================
// Andon 生产监控看板 - 配置层
// ==========================================
// 职责: 进程级配置（环境变量）+ 运行期覆写（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;

// 重导出核心配置
pub use app_config::{AppConfig, ConfigError, DashboardSettings};
pub use config_manager::{config_keys, ConfigManager};
