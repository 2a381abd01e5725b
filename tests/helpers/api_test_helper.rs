// ==========================================
// API 测试环境
// ==========================================
// 同一份测试数据同时写入 SQLite 与内存事件日志
// ==========================================

use std::sync::Arc;

use andon_monitor::api::ProgressApi;
use andon_monitor::config::{ConfigManager, DashboardSettings};
use andon_monitor::domain::{
    CurrentWorkstationProgress, IdealTime, LifecycleRow, OperatorActivity, ProductionEstimate,
    ProductionEvent, ProductionStats, ProgressFilter, ScheduledUnit, StatsScope, SummaryRow,
    WorkstationDuration, WorkstationStats,
};
use andon_monitor::engine::EventLog;
use andon_monitor::repository::{
    ProgressReadModel, ProgressRepository, RepositoryError, RepositoryResult,
};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use crate::test_helpers::{create_test_db, open_shared_conn, seed_repository};

pub struct ApiTestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub repo: Arc<ProgressRepository>,
    pub config_manager: Arc<ConfigManager>,
    pub sql_api: ProgressApi,
    pub log: Arc<EventLog>,
    pub log_api: ProgressApi,
}

impl ApiTestEnv {
    /// 写入测试数据并构建两套 API
    pub fn with_data(
        events: Vec<ProductionEvent>,
        ideal_times: Vec<IdealTime>,
        schedule: Vec<ScheduledUnit>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let conn = open_shared_conn(&db_path)?;
        let repo = Arc::new(ProgressRepository::new(conn.clone()));
        seed_repository(&repo, &events, &ideal_times, &schedule)?;

        let mut log = EventLog::from_events(events);
        for ideal in ideal_times {
            log.add_ideal_time(ideal);
        }
        for unit in schedule {
            log.add_schedule(unit);
        }
        let log = Arc::new(log);

        let config_manager = Arc::new(ConfigManager::from_connection(conn));
        let sql_api = ProgressApi::new(repo.clone(), DashboardSettings::default())
            .with_config_manager(config_manager.clone());
        let log_api = ProgressApi::new(log.clone(), DashboardSettings::default());

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            repo,
            config_manager,
            sql_api,
            log,
            log_api,
        })
    }
}

// ==========================================
// FailingReadModel - 所有查询均失败
// ==========================================

pub struct FailingReadModel;

fn unavailable<T>() -> RepositoryResult<T> {
    Err(RepositoryError::DatabaseConnectionError(
        "connection refused".to_string(),
    ))
}

impl ProgressReadModel for FailingReadModel {
    fn current_by_workstation(
        &self,
        _today: NaiveDate,
    ) -> RepositoryResult<Vec<CurrentWorkstationProgress>> {
        unavailable()
    }

    fn lifecycle_rows(
        &self,
        _since_date: NaiveDate,
        _process_name: &str,
    ) -> RepositoryResult<Vec<LifecycleRow>> {
        unavailable()
    }

    fn summary_rows(&self, _since: NaiveDateTime) -> RepositoryResult<Vec<SummaryRow>> {
        unavailable()
    }

    fn production_stats(&self, _scope: &StatsScope) -> RepositoryResult<ProductionStats> {
        unavailable()
    }

    fn workstation_stats(&self, _line: Option<&str>) -> RepositoryResult<Vec<WorkstationStats>> {
        unavailable()
    }

    fn recent_events(
        &self,
        _today: NaiveDate,
        _limit: usize,
    ) -> RepositoryResult<Vec<ProductionEvent>> {
        unavailable()
    }

    fn list_events(&self, _filter: &ProgressFilter) -> RepositoryResult<Vec<ProductionEvent>> {
        unavailable()
    }

    fn workstation_durations(
        &self,
        _today: NaiveDate,
    ) -> RepositoryResult<Vec<WorkstationDuration>> {
        unavailable()
    }

    fn production_estimate(
        &self,
        _today: NaiveDate,
        _process_name: &str,
    ) -> RepositoryResult<Option<ProductionEstimate>> {
        unavailable()
    }

    fn operator_activity(&self, _today: NaiveDate) -> RepositoryResult<Vec<OperatorActivity>> {
        unavailable()
    }

    fn pending_schedule(&self, _since_date: NaiveDate) -> RepositoryResult<Vec<ScheduledUnit>> {
        unavailable()
    }

    fn events_on(&self, _today: NaiveDate) -> RepositoryResult<Vec<ProductionEvent>> {
        unavailable()
    }
}
