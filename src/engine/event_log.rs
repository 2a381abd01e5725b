// ==========================================
// Andon 生产监控看板 - 内存事件日志
// ==========================================
// 结构: 只追加的事件 arena + 派生索引（按单件 / 按工位）
// 用途: CSV 回放演示、与 SQL 读模型交叉校验
// 约束: 结果与 ProgressRepository 一致（同一时间戳取 id_process 较大者）
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain::progress::{
    CurrentWorkstationProgress, IdealTime, LifecycleRow, OperatorActivity, ProductionEstimate,
    ProductionEvent, ProductionStats, ProgressFilter, ScheduledUnit, StatsScope, SummaryRow,
    WorkstationDuration, WorkstationStats,
};
use crate::engine::status_reducer::latest_event_per_workstation;
use crate::importer::{self, ImportResult};
use crate::repository::error::RepositoryResult;
use crate::repository::read_model::ProgressReadModel;

// ==========================================
// EventLog - 内存事件日志
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<ProductionEvent>,
    by_unit: HashMap<String, Vec<usize>>,
    by_workstation: HashMap<i32, Vec<usize>>,
    ideal_times: Vec<IdealTime>,
    schedule: Vec<ScheduledUnit>,
    next_id: i64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// 批量构建
    pub fn from_events(events: impl IntoIterator<Item = ProductionEvent>) -> Self {
        let mut log = Self::new();
        for event in events {
            log.append(event);
        }
        log
    }

    /// 回放 CSV 导出
    pub fn from_csv_path(path: &Path) -> ImportResult<Self> {
        let events = importer::load_events(path)?;
        tracing::info!(path = %path.display(), count = events.len(), "CSV 回放完成");
        Ok(Self::from_events(events))
    }

    /// 追加事件
    ///
    /// # 返回
    /// - 事件的 id_process（为 0 时自动分配）
    pub fn append(&mut self, event: ProductionEvent) -> i64 {
        let mut event = event.classified();
        if event.id_process <= 0 {
            event.id_process = self.next_id.max(1);
        }
        self.next_id = self.next_id.max(event.id_process + 1);

        let idx = self.events.len();
        if let Some(unit) = &event.unit_id {
            self.by_unit.entry(unit.clone()).or_default().push(idx);
        }
        if let Some(ws) = event.workstation {
            self.by_workstation.entry(ws).or_default().push(idx);
        }

        let id = event.id_process;
        self.events.push(event);
        id
    }

    pub fn add_ideal_time(&mut self, ideal: IdealTime) {
        self.ideal_times.push(ideal);
    }

    pub fn add_schedule(&mut self, mut unit: ScheduledUnit) -> i64 {
        if unit.id <= 0 {
            unit.id = self.schedule.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        }
        let id = unit.id;
        self.schedule.push(unit);
        id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[ProductionEvent] {
        &self.events
    }

    fn indexed<'a>(&'a self, idxs: &'a [usize]) -> impl Iterator<Item = &'a ProductionEvent> + 'a {
        idxs.iter().filter_map(move |i| self.events.get(*i))
    }

    fn total_ideal(&self, product_id: Option<&str>, process_name: &str) -> Option<String> {
        let product_id = product_id?;
        self.ideal_times
            .iter()
            .find(|it| {
                it.product_id == product_id && it.process_name.as_deref() == Some(process_name)
            })
            .and_then(|it| it.duration_time.clone())
    }

    fn workstation_ideal(&self, product_id: Option<&str>, workstation: i32) -> Option<&IdealTime> {
        let product_id = product_id?;
        self.ideal_times
            .iter()
            .find(|it| it.product_id == product_id && it.workstation == Some(workstation))
    }
}

fn started_on(event: &ProductionEvent, day: NaiveDate) -> bool {
    event.started_at.map(|t| t.date()) == Some(day)
}

fn started_since(event: &ProductionEvent, day: NaiveDate) -> bool {
    event.started_at.map_or(false, |t| t.date() >= day)
}

fn matches_scope(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(w) => value == Some(w),
        None => true,
    }
}

fn newest_first(events: &mut [&ProductionEvent]) {
    events.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
}

fn average(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = values.fold((0i64, 0u64), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

impl ProgressReadModel for EventLog {
    fn current_by_workstation(
        &self,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<CurrentWorkstationProgress>> {
        let current = latest_event_per_workstation(&self.events, today)
            .into_iter()
            .filter_map(|event| {
                let ws = event.workstation?;
                let ideal = self.workstation_ideal(event.product_id.as_deref(), ws);
                Some(CurrentWorkstationProgress {
                    workstation: ws,
                    event: event.clone(),
                    target_duration: ideal.and_then(|it| it.duration_time.clone()),
                    target_percentage: ideal.and_then(|it| it.percentage),
                })
            })
            .collect();

        Ok(current)
    }

    fn lifecycle_rows(
        &self,
        since_date: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Vec<LifecycleRow>> {
        let mut rows: Vec<LifecycleRow> = self
            .by_unit
            .values()
            .filter_map(|idxs| {
                let windowed: Vec<&ProductionEvent> = self
                    .indexed(idxs)
                    .filter(|e| started_since(e, since_date))
                    .collect();
                let latest = windowed.iter().max_by_key(|e| e.recency_key())?;
                let first_station_start = windowed
                    .iter()
                    .filter(|e| e.workstation == Some(1))
                    .filter_map(|e| e.started_at)
                    .min();

                Some(LifecycleRow {
                    event: (*latest).clone(),
                    first_station_start,
                    ideal_duration: self.total_ideal(latest.product_id.as_deref(), process_name),
                })
            })
            .collect();

        rows.sort_by(|a, b| b.event.recency_key().cmp(&a.event.recency_key()));
        Ok(rows)
    }

    fn summary_rows(&self, since: NaiveDateTime) -> RepositoryResult<Vec<SummaryRow>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.started_at.map_or(false, |t| t >= since))
            .map(|e| SummaryRow {
                unit_id: e.unit_id.clone(),
                signal: e.signal.clone(),
            })
            .collect())
    }

    fn production_stats(&self, scope: &StatsScope) -> RepositoryResult<ProductionStats> {
        let scoped: Vec<&ProductionEvent> = self
            .events
            .iter()
            .filter(|e| matches_scope(e.workshop.as_deref(), scope.workshop.as_deref()))
            .filter(|e| matches_scope(e.line.as_deref(), scope.line.as_deref()))
            .collect();

        Ok(ProductionStats {
            total_processes: scoped.len() as u64,
            completed: scoped.iter().filter(|e| e.finished_at.is_some()).count() as u64,
            in_progress: scoped
                .iter()
                .filter(|e| e.started_at.is_some() && e.finished_at.is_none())
                .count() as u64,
            pending: scoped.iter().filter(|e| e.started_at.is_none()).count() as u64,
            avg_duration_sec: average(scoped.iter().filter_map(|e| e.duration_seconds)),
            total_duration_sec: scoped.iter().filter_map(|e| e.duration_seconds).sum(),
        })
    }

    fn workstation_stats(&self, line: Option<&str>) -> RepositoryResult<Vec<WorkstationStats>> {
        let mut stats: Vec<WorkstationStats> = self
            .by_workstation
            .iter()
            .filter_map(|(ws, idxs)| {
                let scoped: Vec<&ProductionEvent> = self
                    .indexed(idxs)
                    .filter(|e| matches_scope(e.line.as_deref(), line))
                    .collect();
                let latest = scoped.iter().max_by_key(|e| e.recency_key())?;

                Some(WorkstationStats {
                    workstation: *ws,
                    total_processes: scoped.len() as u64,
                    completed: scoped.iter().filter(|e| e.finished_at.is_some()).count() as u64,
                    avg_duration_sec: average(scoped.iter().filter_map(|e| e.duration_seconds)),
                    active_operator: latest.operator_name.clone(),
                    product_name: latest.product_name.clone(),
                    unit_id: latest.unit_id.clone(),
                })
            })
            .collect();

        stats.sort_by_key(|s| s.workstation);
        Ok(stats)
    }

    fn recent_events(
        &self,
        today: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<ProductionEvent>> {
        let mut events = self.events_on(today)?;
        events.truncate(limit);
        Ok(events)
    }

    fn list_events(&self, filter: &ProgressFilter) -> RepositoryResult<Vec<ProductionEvent>> {
        let mut limit = filter.limit.clamp(1, ProgressFilter::MAX_LIMIT);
        let term = filter.search_term().map(str::to_lowercase);
        if term.is_some() {
            limit = limit.min(ProgressFilter::SEARCH_CAP);
        }

        let contains = |field: &Option<String>, t: &str| {
            field
                .as_deref()
                .map_or(false, |v| v.to_lowercase().contains(t))
        };

        let mut matched: Vec<&ProductionEvent> = self
            .events
            .iter()
            .filter(|e| match &term {
                Some(t) => {
                    contains(&e.project_name, t)
                        || contains(&e.product_name, t)
                        || contains(&e.operator_name, t)
                        || contains(&e.process_name, t)
                }
                None => true,
            })
            .filter(|e| matches_scope(e.workshop.as_deref(), filter.workshop.as_deref()))
            .filter(|e| matches_scope(e.line.as_deref(), filter.line.as_deref()))
            .collect();

        newest_first(&mut matched);
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    fn workstation_durations(
        &self,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<WorkstationDuration>> {
        let mut todays: Vec<&ProductionEvent> = self
            .events
            .iter()
            .filter(|e| e.workstation.is_some() && started_on(e, today))
            .collect();
        // 工位升序，同工位内最新在前
        todays.sort_by(|a, b| {
            a.workstation
                .cmp(&b.workstation)
                .then_with(|| b.recency_key().cmp(&a.recency_key()))
        });

        Ok(todays
            .into_iter()
            .map(|e| WorkstationDuration {
                workstation: e.workstation.unwrap_or_default(),
                actual_duration: e.duration_formatted.clone(),
            })
            .collect())
    }

    fn production_estimate(
        &self,
        today: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Option<ProductionEstimate>> {
        let candidate = self
            .by_workstation
            .get(&1)
            .and_then(|idxs| {
                self.indexed(idxs)
                    .filter(|e| e.finished_at.is_none() && started_on(e, today))
                    .max_by_key(|e| e.recency_key())
            });

        Ok(candidate.map(|e| ProductionEstimate {
            product_id: e.product_id.clone(),
            unit_id: e.unit_id.clone(),
            product_name: e.product_name.clone(),
            started_at: e.started_at,
            total_duration: self.total_ideal(e.product_id.as_deref(), process_name),
            estimated_finish: None,
        }))
    }

    fn operator_activity(&self, today: NaiveDate) -> RepositoryResult<Vec<OperatorActivity>> {
        let todays = self.events.iter().filter(|e| {
            started_on(e, today)
                && e.operator_name
                    .as_deref()
                    .map_or(false, |n| !n.trim().is_empty())
        });

        let mut grouped: HashMap<&str, Vec<&ProductionEvent>> = HashMap::new();
        for e in todays {
            if let Some(name) = e.operator_name.as_deref() {
                grouped.entry(name).or_default().push(e);
            }
        }

        let mut activity: Vec<OperatorActivity> = grouped
            .into_iter()
            .map(|(name, events)| {
                let latest = events.iter().max_by_key(|e| e.recency_key());
                OperatorActivity {
                    operator_rfid: events.iter().filter_map(|e| e.operator_rfid).max(),
                    operator_name: name.to_string(),
                    events_today: events.len() as u64,
                    completed_today: events.iter().filter(|e| e.finished_at.is_some()).count()
                        as u64,
                    total_duration_sec: events.iter().filter_map(|e| e.duration_seconds).sum(),
                    last_seen_at: events.iter().filter_map(|e| e.started_at).max(),
                    current_workstation: latest.and_then(|e| e.workstation),
                }
            })
            .collect();

        activity.sort_by(|a, b| {
            b.last_seen_at
                .cmp(&a.last_seen_at)
                .then_with(|| a.operator_name.cmp(&b.operator_name))
        });
        Ok(activity)
    }

    fn pending_schedule(&self, since_date: NaiveDate) -> RepositoryResult<Vec<ScheduledUnit>> {
        let started_products: HashSet<&str> = self
            .events
            .iter()
            .filter(|e| started_since(e, since_date))
            .filter_map(|e| e.product_id.as_deref())
            .collect();

        let mut pending: Vec<ScheduledUnit> = self
            .schedule
            .iter()
            .filter(|s| {
                s.product_id
                    .as_deref()
                    .map_or(true, |p| !started_products.contains(p))
            })
            .cloned()
            .collect();

        pending.sort_by_key(|s| (s.start_schedule, s.id));
        Ok(pending)
    }

    fn events_on(&self, today: NaiveDate) -> RepositoryResult<Vec<ProductionEvent>> {
        let mut todays: Vec<&ProductionEvent> =
            self.events.iter().filter(|e| started_on(e, today)).collect();
        newest_first(&mut todays);
        Ok(todays.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StageSignal;

    fn ts(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn event(unit: &str, ws: i32, start: NaiveDateTime, status: &str) -> ProductionEvent {
        ProductionEvent {
            id_process: 0,
            product_id: Some("PNL-100".to_string()),
            unit_id: Some(unit.to_string()),
            project_name: None,
            product_name: None,
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

    #[test]
    fn test_append_assigns_ids_and_classifies() {
        let mut log = EventLog::new();
        let a = log.append(event("U1", 1, ts(1, 8), "Masuk WS1"));
        let mut explicit = event("U1", 2, ts(1, 9), "Gangguan Listrik");
        explicit.id_process = 40;
        let b = log.append(explicit);
        let c = log.append(event("U2", 1, ts(1, 10), "Masuk WS1"));

        assert_eq!((a, b, c), (1, 40, 41));
        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[1].signal, StageSignal::Disrupted);
    }

    #[test]
    fn test_lifecycle_rows_from_index() {
        let mut log = EventLog::from_events(vec![
            event("U1", 1, ts(1, 8), "Masuk WS1"),
            event("U1", 2, ts(1, 10), "Masuk WS2"),
            event("U2", 1, ts(3, 8), "Masuk WS1"),
        ]);
        log.add_ideal_time(IdealTime {
            product_id: "PNL-100".to_string(),
            process_name: Some("total_production_qc".to_string()),
            workstation: None,
            duration_time: Some("02:30:00".to_string()),
            percentage: None,
        });

        let rows = log
            .lifecycle_rows(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "total_production_qc")
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event.unit_id.as_deref(), Some("U2"));
        assert_eq!(rows[1].event.workstation, Some(2));
        assert_eq!(rows[1].first_station_start, Some(ts(1, 8)));
        assert_eq!(rows[1].ideal_duration.as_deref(), Some("02:30:00"));
    }

    #[test]
    fn test_current_by_workstation_today_only() {
        let log = EventLog::from_events(vec![
            event("U1", 1, ts(1, 23), "Masuk WS1"),
            event("U2", 2, ts(2, 8), "Masuk WS2"),
        ]);
        let current = log
            .current_by_workstation(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].workstation, 2);
    }
}
