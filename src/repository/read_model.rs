// ==========================================
// Andon 生产监控看板 - 进度读模型接口
// ==========================================
// 实现: ProgressRepository (SQLite) / EventLog (内存)
// 约束: 只读；同一输入两种实现结果一致
// 同一时间戳的事件按 id_process 较大者为新
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::progress::{
    CurrentWorkstationProgress, LifecycleRow, OperatorActivity, ProductionEstimate,
    ProductionEvent, ProductionStats, ProgressFilter, ScheduledUnit, StatsScope, SummaryRow,
    WorkstationDuration, WorkstationStats,
};
use crate::repository::error::RepositoryResult;

/// 生产进度读模型
pub trait ProgressReadModel: Send + Sync {
    /// 当日每个工位的最新事件，附带按工位的理想工时
    fn current_by_workstation(
        &self,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<CurrentWorkstationProgress>>;

    /// 窗口内每个单件的代表事件 + WS1 最早开始 + 理想总工时
    ///
    /// # 参数
    /// - `since_date`: DATE(start_actual) >= since_date
    /// - `process_name`: ideal_time.process_name（默认 total_production_qc）
    fn lifecycle_rows(
        &self,
        since_date: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Vec<LifecycleRow>>;

    /// 窗口内全部事件的 (单件, 状态信号)
    fn summary_rows(&self, since: NaiveDateTime) -> RepositoryResult<Vec<SummaryRow>>;

    /// 进度总览（可按车间/产线过滤）
    fn production_stats(&self, scope: &StatsScope) -> RepositoryResult<ProductionStats>;

    /// 工位统计（可按产线过滤）
    fn workstation_stats(&self, line: Option<&str>) -> RepositoryResult<Vec<WorkstationStats>>;

    /// 当日事件，最新在前
    fn recent_events(&self, today: NaiveDate, limit: usize)
        -> RepositoryResult<Vec<ProductionEvent>>;

    /// 搜索 / 车间 / 产线过滤，最新在前
    fn list_events(&self, filter: &ProgressFilter) -> RepositoryResult<Vec<ProductionEvent>>;

    /// 当日各工位实际用时（工位升序，同工位内最新在前）
    fn workstation_durations(&self, today: NaiveDate)
        -> RepositoryResult<Vec<WorkstationDuration>>;

    /// 当日最新未完成 WS1 事件的预计完工
    fn production_estimate(
        &self,
        today: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Option<ProductionEstimate>>;

    /// 当日操作工活动
    fn operator_activity(&self, today: NaiveDate) -> RepositoryResult<Vec<OperatorActivity>>;

    /// 窗口内尚无事件的排产计划
    fn pending_schedule(&self, since_date: NaiveDate) -> RepositoryResult<Vec<ScheduledUnit>>;

    /// 当日原始事件
    fn events_on(&self, today: NaiveDate) -> RepositoryResult<Vec<ProductionEvent>>;
}
