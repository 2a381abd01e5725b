// ==========================================
// Andon 生产监控看板 - 生产进度数据仓储
// ==========================================
// 数据源: production_progress / ideal_time / production_schedule
// 红线: Repository 不做业务逻辑，只做数据映射
// ==========================================

mod core;
mod queries;


pub use core::ProgressRepository;
