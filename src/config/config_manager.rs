// ==========================================
// Andon 生产监控看板 - 配置管理器
// ==========================================
// 职责: 运行期配置覆写（config_kv 表, scope_id='global'）
// 优先级: config_kv > 环境变量 > 内置默认值
// 非法值: 记录 warn 并沿用下层值，不中断请求
// ==========================================

use crate::config::app_config::{parse_days_back, parse_workstations, ConfigError, DashboardSettings};
use crate::db::open_sqlite_connection;
use crate::domain::types::SummaryCountMode;
use crate::i18n;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const LOCALE: &str = "andon/locale";
    pub const DEFAULT_DAYS_BACK: &str = "andon/default_days_back";
    pub const RECENT_LIMIT: &str = "andon/recent_limit";
    pub const WORKSTATIONS: &str = "andon/workstations";
    pub const IDEAL_PROCESS_NAME: &str = "andon/ideal_process_name";
    pub const SUMMARY_COUNT_MODE: &str = "andon/summary_count_mode";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> Result<std::sync::MutexGuard<Connection>, ConfigError> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 所有 global 配置的快照（按键排序）
    pub fn get_config_snapshot(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(rows)
    }

    /// 在环境变量层之上叠加 config_kv 覆写
    ///
    /// # 参数
    /// - base: 环境变量层（AppConfig.dashboard）
    ///
    /// # 返回
    /// - 存储读取失败时返回错误；单个值非法只告警
    pub fn dashboard_settings(
        &self,
        base: &DashboardSettings,
    ) -> Result<DashboardSettings, ConfigError> {
        let mut settings = base.clone();

        if let Some(raw) = self.get_global_config_value(config_keys::LOCALE)? {
            settings.locale = i18n::normalize_locale(&raw).to_string();
        }

        if let Some(raw) = self.get_global_config_value(config_keys::DEFAULT_DAYS_BACK)? {
            match parse_days_back(&raw) {
                Ok(days) => settings.default_days_back = days,
                Err(e) => warn_invalid(config_keys::DEFAULT_DAYS_BACK, &raw, &e),
            }
        }

        if let Some(raw) = self.get_global_config_value(config_keys::RECENT_LIMIT)? {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => settings.recent_limit = limit,
                _ => warn_invalid(config_keys::RECENT_LIMIT, &raw, "需为正整数"),
            }
        }

        if let Some(raw) = self.get_global_config_value(config_keys::WORKSTATIONS)? {
            match parse_workstations(&raw) {
                Ok(list) => settings.workstations = list,
                Err(e) => warn_invalid(config_keys::WORKSTATIONS, &raw, &e),
            }
        }

        if let Some(raw) = self.get_global_config_value(config_keys::IDEAL_PROCESS_NAME)? {
            let name = raw.trim();
            if name.is_empty() {
                warn_invalid(config_keys::IDEAL_PROCESS_NAME, &raw, "不能为空");
            } else {
                settings.ideal_process_name = name.to_string();
            }
        }

        if let Some(raw) = self.get_global_config_value(config_keys::SUMMARY_COUNT_MODE)? {
            match SummaryCountMode::parse(&raw) {
                Some(mode) => settings.summary_count_mode = mode,
                None => warn_invalid(config_keys::SUMMARY_COUNT_MODE, &raw, "可选 events / units"),
            }
        }

        Ok(settings)
    }
}

fn warn_invalid(key: &str, value: &str, reason: &str) {
    tracing::warn!(key, value, reason, "config_kv 配置值无效，沿用默认值");
}
