// ==========================================
// Andon 生产监控看板 - 生产进度 API
// ==========================================
// 职责: 并发扇出读模型查询 → 状态归约 → 看板聚合
// 降级: 单个查询失败记录 warn 并以空数组 / 零值代替；
//       全部查询失败才返回 ApiError::DataUnavailable
// 架构: API 层 → ProgressReadModel（SQLite / 内存事件日志）+ status_reducer
// ==========================================

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;

use crate::api::dto::{DashboardSnapshot, ProgressList, ShortageFeed, ShortageNotification};
use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, DashboardSettings};
use crate::domain::progress::{
    ProductLifecycleCard, ProgressFilter, StatsScope, StatusSummary,
};
use crate::domain::types::{DaysBack, ReportWindow};
use crate::engine::estimate::{self, DurationUnits};
use crate::engine::status_reducer;
use crate::i18n;
use crate::perf::PerfGuard;
use crate::repository::error::RepositoryResult;
use crate::repository::read_model::ProgressReadModel;

/// 看板聚合的查询数
const DASHBOARD_QUERY_COUNT: usize = 10;
/// 进度列表的查询数
const PROGRESS_LIST_QUERY_COUNT: usize = 3;

// ==========================================
// ProgressApi - 生产进度 API
// ==========================================
pub struct ProgressApi {
    read_model: Arc<dyn ProgressReadModel>,
    base_settings: DashboardSettings,
    config_manager: Option<Arc<ConfigManager>>,
}

impl ProgressApi {
    /// 创建新的ProgressApi实例
    ///
    /// # 参数
    /// - read_model: 读模型（SQLite 仓储或内存事件日志）
    /// - base_settings: 环境变量层的看板参数
    pub fn new(read_model: Arc<dyn ProgressReadModel>, base_settings: DashboardSettings) -> Self {
        Self {
            read_model,
            base_settings,
            config_manager: None,
        }
    }

    /// 叠加 config_kv 运行期覆写（每次请求读取）
    pub fn with_config_manager(mut self, config_manager: Arc<ConfigManager>) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    /// 当前生效的看板参数
    ///
    /// config_kv 读取失败时记录 warn 并使用环境变量层
    pub fn settings(&self) -> DashboardSettings {
        resolve_settings(self.config_manager.as_deref(), &self.base_settings)
    }

    /// 当前生效的看板参数（在阻塞线程池读取 config_kv）
    pub async fn current_settings(&self) -> DashboardSettings {
        let Some(manager) = self.config_manager.clone() else {
            return self.base_settings.clone();
        };
        let base = self.base_settings.clone();
        let fallback = base.clone();
        tokio::task::spawn_blocking(move || resolve_settings(Some(manager.as_ref()), &base))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "配置读取任务异常，使用环境变量配置");
                fallback
            })
    }

    // ==========================================
    // 单项查询（同步，失败降级）
    // ==========================================

    /// 生命周期卡片
    ///
    /// # 返回
    /// - 查询失败时返回空数组（记录 warn），从不向调用方报错
    pub fn get_product_status_cards(&self, window: &ReportWindow) -> Vec<ProductLifecycleCard> {
        let settings = self.settings();
        let rows = degrade(
            "lifecycle_rows",
            self.read_model
                .lifecycle_rows(window.since_date(), &settings.ideal_process_name),
        );
        status_reducer::lifecycle_cards(rows)
    }

    /// 全厂状态计数
    ///
    /// # 返回
    /// - 查询失败时返回全零记录（记录 warn），从不向调用方报错
    pub fn get_product_status_summary(&self, window: &ReportWindow) -> StatusSummary {
        let settings = self.settings();
        let rows = degrade(
            "summary_rows",
            self.read_model.summary_rows(window.since_instant()),
        );
        status_reducer::summarize(&rows, settings.summary_count_mode)
    }

    // ==========================================
    // 聚合查询（异步扇出）
    // ==========================================

    /// 看板聚合
    ///
    /// # 参数
    /// - days_back: 回看天数（工位快照 / 当日类查询不受其影响）
    /// - now: 当前时间（本地工厂时间）
    ///
    /// # 返回
    /// - Ok(DashboardSnapshot): 部分查询失败时对应字段为空
    /// - Err(ApiError::DataUnavailable): 全部查询失败
    pub async fn load_dashboard(
        &self,
        days_back: DaysBack,
        now: NaiveDateTime,
    ) -> ApiResult<DashboardSnapshot> {
        let started = Instant::now();
        let settings = self.current_settings().await;

        let window = ReportWindow::new(now, days_back);
        let today = window.today();
        let since_date = window.since_date();
        let since_instant = window.since_instant();
        let recent_limit = settings.recent_limit;
        let estimate_process = settings.ideal_process_name.clone();
        let lifecycle_process = settings.ideal_process_name.clone();

        let (
            stats,
            current,
            recent,
            durations,
            production_estimate,
            lifecycle,
            summary,
            operators,
            todays,
            schedule,
        ) = futures::join!(
            self.query("production_stats", |m| m.production_stats(&StatsScope::default())),
            self.query("current_by_workstation", move |m| m.current_by_workstation(today)),
            self.query("recent_events", move |m| m.recent_events(today, recent_limit)),
            self.query("workstation_durations", move |m| m.workstation_durations(today)),
            self.query("production_estimate", move |m| {
                m.production_estimate(today, &estimate_process)
            }),
            self.query("lifecycle_rows", move |m| {
                m.lifecycle_rows(since_date, &lifecycle_process)
            }),
            self.query("summary_rows", move |m| m.summary_rows(since_instant)),
            self.query("operator_activity", move |m| m.operator_activity(today)),
            self.query("events_on", move |m| m.events_on(today)),
            self.query("pending_schedule", move |m| m.pending_schedule(since_date)),
        );

        let mut degraded = Degraded::default();
        let stats = degraded.take(stats);
        let current = degraded.take(current);
        let recent = degraded.take(recent);
        let durations = degraded.take(durations);
        let production_estimate = degraded.take(production_estimate);
        let lifecycle = degraded.take(lifecycle);
        let summary = degraded.take(summary);
        let operators = degraded.take(operators);
        let todays = degraded.take(todays);
        let schedule = degraded.take(schedule);

        if degraded.failed.len() == DASHBOARD_QUERY_COUNT {
            tracing::error!(days_back = days_back.get(), "看板聚合全部查询失败");
            return Err(ApiError::DataUnavailable {
                failed: DASHBOARD_QUERY_COUNT,
            });
        }

        let units = DurationUnits::for_locale(&settings.locale);
        let workstations =
            status_reducer::workstation_snapshots(&current, &settings.workstations, now, &units);
        let cards = status_reducer::lifecycle_cards(lifecycle);
        let status_summary = status_reducer::summarize(&summary, settings.summary_count_mode);
        let abnormal = status_reducer::abnormal_events(todays);
        let board = status_reducer::build_board(&cards, &schedule);

        tracing::info!(
            days_back = days_back.get(),
            cards = cards.len(),
            degraded = degraded.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "看板聚合完成"
        );

        Ok(DashboardSnapshot {
            stats,
            workstations,
            recent,
            current,
            durations,
            estimate: production_estimate.map(estimate::complete_estimate),
            cards,
            status_summary,
            operators,
            abnormal,
            schedule,
            days_back,
            updated_at: now,
            board,
            degraded: degraded.failed,
        })
    }

    /// 进度列表（搜索 / 车间 / 产线过滤）
    ///
    /// # 参数
    /// - filter: 过滤条件；stats 按车间+产线，工位统计按产线
    pub async fn list_progress(&self, filter: ProgressFilter) -> ApiResult<ProgressList> {
        let started = Instant::now();
        let scope = StatsScope {
            workshop: filter.workshop.clone(),
            line: filter.line.clone(),
        };
        let line = filter.line.clone();

        let (stats, workstations, recent) = futures::join!(
            self.query("production_stats", move |m| m.production_stats(&scope)),
            self.query("workstation_stats", move |m| m.workstation_stats(line.as_deref())),
            self.query("list_events", move |m| m.list_events(&filter)),
        );

        let mut degraded = Degraded::default();
        let stats = degraded.take(stats);
        let workstations = degraded.take(workstations);
        let recent = degraded.take(recent);

        if degraded.failed.len() == PROGRESS_LIST_QUERY_COUNT {
            return Err(ApiError::DataUnavailable {
                failed: PROGRESS_LIST_QUERY_COUNT,
            });
        }

        tracing::info!(
            rows = recent.len(),
            degraded = degraded.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "进度列表查询完成"
        );

        Ok(ProgressList {
            stats,
            workstations,
            recent,
        })
    }

    /// 当日缺料（Kurang Komponen）通知，最新在前
    pub async fn shortage_feed(&self, now: NaiveDateTime) -> ApiResult<ShortageFeed> {
        let locale = self.current_settings().await.locale;
        let today = now.date();

        let events = self
            .query("events_on", move |m| m.events_on(today))
            .await
            .result?;

        let unknown = i18n::t_in(&locale, "notification.unknown");
        let no_note = i18n::t_in(&locale, "notification.no_note");

        let notifications: Vec<ShortageNotification> = status_reducer::shortage_events(events)
            .into_iter()
            .map(|e| ShortageNotification {
                id: e.unit_id.clone().unwrap_or_default(),
                operator_name: e.operator_name.unwrap_or_else(|| unknown.clone()),
                note: e.qc_note.unwrap_or_else(|| no_note.clone()),
                product_name: e.product_name.unwrap_or_else(|| unknown.clone()),
                serial_number: e.unit_id.unwrap_or_else(|| "-".to_string()),
                timestamp: e.started_at,
            })
            .collect();

        Ok(ShortageFeed {
            count: notifications.len(),
            notifications,
        })
    }

    /// 在阻塞线程池执行一次读模型查询
    async fn query<T, F>(&self, op: &'static str, f: F) -> Queried<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ProgressReadModel) -> RepositoryResult<T> + Send + 'static,
    {
        let model = Arc::clone(&self.read_model);
        let joined = tokio::task::spawn_blocking(move || {
            let _perf = PerfGuard::new(op);
            f(model.as_ref())
        })
        .await;

        let result = match joined {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => Err(ApiError::InternalError(format!("{} 查询任务异常: {}", op, e))),
        };
        Queried { op, result }
    }
}

// ==========================================
// 降级辅助
// ==========================================

struct Queried<T> {
    op: &'static str,
    result: ApiResult<T>,
}

#[derive(Default)]
struct Degraded {
    failed: Vec<String>,
}

impl Degraded {
    fn take<T: Default>(&mut self, queried: Queried<T>) -> T {
        match queried.result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(op = queried.op, error = %e, "查询失败，降级为空结果");
                self.failed.push(queried.op.to_string());
                T::default()
            }
        }
    }
}

fn degrade<T: Default>(op: &'static str, result: RepositoryResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(op, error = %e, "查询失败，降级为空结果");
        T::default()
    })
}

fn resolve_settings(
    manager: Option<&ConfigManager>,
    base: &DashboardSettings,
) -> DashboardSettings {
    match manager {
        Some(manager) => manager.dashboard_settings(base).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取 config_kv 失败，使用环境变量配置");
            base.clone()
        }),
        None => base.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::progress::ProductionEvent;
    use crate::domain::types::StageSignal;
    use crate::engine::EventLog;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(unit: &str, ws: i32, status: &str, start: NaiveDateTime) -> ProductionEvent {
        ProductionEvent {
            id_process: 0,
            product_id: Some("P-1".to_string()),
            unit_id: Some(unit.to_string()),
            project_name: None,
            product_name: Some("Panel".to_string()),
            line: None,
            workshop: None,
            process_name: None,
            workstation: Some(ws),
            operator_rfid: None,
            operator_name: None,
            started_at: Some(start),
            finished_at: None,
            duration_seconds: None,
            duration_formatted: None,
            status: Some(status.to_string()),
            qc_note: None,
            signal: StageSignal::Unknown { raw: String::new() },
        }
    }

    fn api(events: Vec<ProductionEvent>) -> ProgressApi {
        ProgressApi::new(
            Arc::new(EventLog::from_events(events)),
            DashboardSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_load_dashboard_empty_store() {
        let snapshot = api(Vec::new())
            .load_dashboard(DaysBack::default(), at(12, 0))
            .await
            .unwrap();

        assert!(snapshot.cards.is_empty());
        assert_eq!(snapshot.status_summary, StatusSummary::default());
        assert_eq!(snapshot.workstations.len(), 5);
        assert!(snapshot.workstations.iter().all(|w| !w.occupied));
        assert!(snapshot.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_shortage_feed_defaults() {
        let mut shortage = event("U-7", 2, "Kurang Komponen", at(9, 0));
        shortage.operator_name = None;
        let feed = api(vec![shortage, event("U-8", 1, "Masuk WS1", at(9, 5))])
            .shortage_feed(at(12, 0))
            .await
            .unwrap();

        assert_eq!(feed.count, 1);
        let n = &feed.notifications[0];
        assert_eq!(n.id, "U-7");
        assert_eq!(n.serial_number, "U-7");
        assert_eq!(n.operator_name, "Tidak diketahui");
        assert_eq!(n.note, "Tidak ada catatan");
    }

    #[test]
    fn test_sync_cards_and_summary() {
        let api = api(vec![
            event("U-1", 1, "Masuk WS1", at(8, 0)),
            event("U-1", 2, "Gangguan Mesin", at(9, 0)),
        ]);
        let window = ReportWindow::new(at(12, 0), DaysBack::default());

        let cards = api.get_product_status_cards(&window);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].current_workstation, Some(2));

        let summary = api.get_product_status_summary(&window);
        assert_eq!(summary.gangguan, 1);
    }
}
