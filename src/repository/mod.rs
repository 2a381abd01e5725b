// ==========================================
// Andon 生产监控看板 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供只读数据访问接口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod db_utils;
pub mod error;
pub mod progress_repo;
pub mod read_model;
pub mod sql_builder;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use progress_repo::ProgressRepository;
pub use read_model::ProgressReadModel;
