// ==========================================
// Andon 生产监控看板 - 进程级配置
// ==========================================
// 来源: 环境变量（ANDON_*），缺省值见各字段
// 运行期覆写见 config_manager（config_kv 表）
// ==========================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::types::{DaysBack, SummaryCountMode};
use crate::i18n;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效 ({key}={value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置存储读取失败: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("配置存储锁获取失败: {0}")]
    LockError(String),
}

// ==========================================
// 环境变量名
// ==========================================
pub mod env_keys {
    pub const DB_PATH: &str = "ANDON_DB_PATH";
    pub const BIND_ADDR: &str = "ANDON_BIND_ADDR";
    pub const REPLAY_CSV: &str = "ANDON_REPLAY_CSV";
    pub const LOCALE: &str = "ANDON_LOCALE";
    pub const DEFAULT_DAYS_BACK: &str = "ANDON_DEFAULT_DAYS_BACK";
    pub const WORKSTATIONS: &str = "ANDON_WORKSTATIONS";
    pub const POLL_INTERVAL_SECS: &str = "ANDON_POLL_INTERVAL_SECS";
    pub const REQUEST_TIMEOUT_SECS: &str = "ANDON_REQUEST_TIMEOUT_SECS";
}

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_WORKSTATIONS: [i32; 5] = [1, 2, 3, 4, 5];
pub const DEFAULT_IDEAL_PROCESS_NAME: &str = "total_production_qc";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// ==========================================
// DashboardSettings - 看板聚合参数（可被 config_kv 覆写）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub locale: String,
    pub default_days_back: DaysBack,
    pub recent_limit: usize,
    pub workstations: Vec<i32>,
    pub ideal_process_name: String,
    pub summary_count_mode: SummaryCountMode,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            locale: i18n::DEFAULT_LOCALE.to_string(),
            default_days_back: DaysBack::default(),
            recent_limit: 20,
            workstations: DEFAULT_WORKSTATIONS.to_vec(),
            ideal_process_name: DEFAULT_IDEAL_PROCESS_NAME.to_string(),
            summary_count_mode: SummaryCountMode::default(),
        }
    }
}

// ==========================================
// AppConfig - 进程级配置
// ==========================================
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,     // None → 默认数据目录
    pub bind_addr: SocketAddr,
    pub replay_csv: Option<PathBuf>,  // 设置后使用内存事件日志
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub dashboard: DashboardSettings, // 环境变量层的看板参数
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（测试注入）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get(env_keys::BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid(env_keys::BIND_ADDR, &bind_raw, e))?;

        let mut dashboard = DashboardSettings::default();
        if let Some(locale) = get(env_keys::LOCALE) {
            dashboard.locale = i18n::normalize_locale(&locale).to_string();
        }
        if let Some(raw) = get(env_keys::DEFAULT_DAYS_BACK) {
            dashboard.default_days_back = parse_days_back(&raw)
                .map_err(|m| invalid(env_keys::DEFAULT_DAYS_BACK, &raw, m))?;
        }
        if let Some(raw) = get(env_keys::WORKSTATIONS) {
            dashboard.workstations =
                parse_workstations(&raw).map_err(|m| invalid(env_keys::WORKSTATIONS, &raw, m))?;
        }

        Ok(Self {
            db_path: get(env_keys::DB_PATH).map(PathBuf::from),
            bind_addr,
            replay_csv: get(env_keys::REPLAY_CSV).map(PathBuf::from),
            poll_interval: secs(&get, env_keys::POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS)?,
            request_timeout: secs(
                &get,
                env_keys::REQUEST_TIMEOUT_SECS,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            dashboard,
        })
    }
}

fn secs<G>(get: &G, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => match raw.parse::<u64>() {
            Ok(v) if v > 0 => Ok(Duration::from_secs(v)),
            Ok(_) => Err(invalid(key, &raw, "必须大于 0")),
            Err(e) => Err(invalid(key, &raw, e)),
        },
    }
}

fn invalid(key: &str, value: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

/// 解析回看天数（收敛到 1..=365）
pub fn parse_days_back(raw: &str) -> Result<DaysBack, String> {
    raw.trim()
        .parse::<i64>()
        .map(DaysBack::clamped)
        .map_err(|e| e.to_string())
}

/// 解析工位集合 "1,2,3" → 升序去重
pub fn parse_workstations(raw: &str) -> Result<Vec<i32>, String> {
    let mut list = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>().map_err(|e| format!("{}: {}", s, e)))
        .collect::<Result<Vec<_>, _>>()?;

    list.sort_unstable();
    list.dedup();
    if list.is_empty() {
        return Err("工位集合为空".to_string());
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.dashboard, DashboardSettings::default());
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (env_keys::BIND_ADDR, "0.0.0.0:8080"),
            (env_keys::LOCALE, "en-US"),
            (env_keys::DEFAULT_DAYS_BACK, "999"),
            (env_keys::WORKSTATIONS, "3, 1,2,3"),
            (env_keys::POLL_INTERVAL_SECS, "30"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.dashboard.locale, "en");
        assert_eq!(config.dashboard.default_days_back.get(), 365);
        assert_eq!(config.dashboard.workstations, vec![1, 2, 3]);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(env_keys::BIND_ADDR, "bukan-alamat")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(AppConfig::from_lookup(lookup(&[(env_keys::REQUEST_TIMEOUT_SECS, "0")])).is_err());
        assert!(parse_workstations(" , ").is_err());
    }
}
