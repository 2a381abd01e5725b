// ==========================================
// Andon 生产监控看板 - 应用状态
// ==========================================
// 职责: 按配置选择事件存储，组装 API 实例
// 存储: ANDON_REPLAY_CSV 设置时使用内存事件日志，否则使用 SQLite
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ProgressApi;
use crate::config::{AppConfig, ConfigManager};
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::EventLog;
use crate::repository::{ProgressReadModel, ProgressRepository};

/// 事件存储类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// SQLite 数据库（路径）
    Sqlite(String),
    /// CSV 回放的内存事件日志（路径）
    Replay(String),
}

impl StoreKind {
    pub fn label(&self) -> &'static str {
        match self {
            StoreKind::Sqlite(_) => "sqlite",
            StoreKind::Replay(_) => "replay",
        }
    }
}

/// 应用状态
///
/// 在 axum 路由中以 Arc<AppState> 共享
pub struct AppState {
    /// 进程级配置
    pub config: AppConfig,

    /// 事件存储
    pub store: StoreKind,

    /// 生产进度API
    pub progress_api: Arc<ProgressApi>,
}

impl AppState {
    /// 按配置创建AppState实例
    ///
    /// # 参数
    /// - config: 进程级配置
    ///
    /// # 返回
    /// - Ok(AppState): 成功
    /// - Err(String): 数据库打开/建表失败或 CSV 回放失败
    pub fn new(config: AppConfig) -> Result<Self, String> {
        if let Some(csv_path) = config.replay_csv.clone() {
            tracing::info!("初始化AppState，回放 CSV: {}", csv_path.display());
            let log = EventLog::from_csv_path(&csv_path)
                .map_err(|e| format!("无法回放事件 CSV: {}", e))?;
            let api = ProgressApi::new(Arc::new(log), config.dashboard.clone());
            return Ok(Self {
                store: StoreKind::Replay(csv_path.display().to_string()),
                progress_api: Arc::new(api),
                config,
            });
        }

        let db_path = match &config.db_path {
            Some(path) => path.display().to_string(),
            None => get_default_db_path(),
        };
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        match read_schema_version(&conn) {
            Ok(Some(version)) if version == CURRENT_SCHEMA_VERSION => {}
            Ok(version) => tracing::warn!(
                found = ?version,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 不一致，继续启动"
            ),
            Err(e) => tracing::warn!("schema_version 读取失败(将继续启动): {}", e),
        }

        crate::perf::install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        let repo = Arc::new(ProgressRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));
        let api = ProgressApi::new(repo, config.dashboard.clone())
            .with_config_manager(config_manager);

        Ok(Self {
            store: StoreKind::Sqlite(db_path),
            progress_api: Arc::new(api),
            config,
        })
    }

    /// 使用指定读模型创建（测试 / 嵌入）
    pub fn with_read_model(config: AppConfig, read_model: Arc<dyn ProgressReadModel>) -> Self {
        let api = ProgressApi::new(read_model, config.dashboard.clone());
        Self {
            store: StoreKind::Replay("<memory>".to_string()),
            progress_api: Arc::new(api),
            config,
        }
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - ANDON_DB_PATH 非空时使用该路径
/// - 否则: 用户数据目录/andon-monitor/andon.db（无数据目录时为 ./andon.db）
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(crate::config::app_config::env_keys::DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./andon.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("andon-monitor");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("andon.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with(lookup: &[(&str, String)]) -> AppConfig {
        let pairs = lookup.to_vec();
        AppConfig::from_lookup(move |k| {
            pairs
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_new_with_sqlite_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("andon.db");
        let config = config_with(&[(
            crate::config::app_config::env_keys::DB_PATH,
            db_path.display().to_string(),
        )]);

        let state = AppState::new(config).unwrap();
        assert_eq!(state.store.label(), "sqlite");
        assert!(db_path.exists());
    }

    #[test]
    fn test_new_with_missing_replay_csv_fails() {
        let config = config_with(&[(
            crate::config::app_config::env_keys::REPLAY_CSV,
            "/tidak/ada/events.csv".to_string(),
        )]);
        assert!(AppState::new(config).is_err());
    }
}
