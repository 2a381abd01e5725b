use super::core::{ProgressRepository, EVENT_COLUMNS};
use crate::domain::progress::{
    CurrentWorkstationProgress, LifecycleRow, OperatorActivity, ProductionEstimate,
    ProductionEvent, ProductionStats, ProgressFilter, ScheduledUnit, StatsScope, SummaryRow,
    WorkstationDuration, WorkstationStats,
};
use crate::domain::types::StageSignal;
use crate::repository::db_utils::{format_date, format_timestamp, read_int, read_text, read_timestamp};
use crate::repository::error::RepositoryResult;
use crate::repository::read_model::ProgressReadModel;
use crate::repository::sql_builder::SqlQueryBuilder;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult};

impl ProgressReadModel for ProgressRepository {
    // ==========================================
    // 工位当前状态
    // ==========================================

    fn current_by_workstation(
        &self,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<CurrentWorkstationProgress>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            WITH ranked AS (
                SELECT {cols},
                       ROW_NUMBER() OVER (
                           PARTITION BY pp.workstation
                           ORDER BY pp.start_actual DESC, pp.id_process DESC
                       ) AS rn
                FROM production_progress pp
                WHERE pp.workstation IS NOT NULL
                  AND DATE(pp.start_actual) = ?1
            )
            SELECT r.*,
                   it.duration_time AS target_duration,
                   it.percentage AS target_percentage
            FROM ranked r
            LEFT JOIN ideal_time it
                   ON it.id = (
                       SELECT i2.id FROM ideal_time i2
                       WHERE i2.id_product = r.id_product
                         AND i2.workstation = r.workstation
                       ORDER BY i2.id
                       LIMIT 1
                   )
            WHERE r.rn = 1
            ORDER BY r.workstation
            "#,
            cols = EVENT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_date(today)], |row| {
                let event = Self::map_event_row(row)?;
                Ok(CurrentWorkstationProgress {
                    workstation: event.workstation.unwrap_or_default(),
                    target_duration: read_text(row, "target_duration")?,
                    target_percentage: row.get("target_percentage")?,
                    event,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    // ==========================================
    // 单件生命周期
    // ==========================================

    fn lifecycle_rows(
        &self,
        since_date: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Vec<LifecycleRow>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            WITH latest AS (
                SELECT {cols},
                       ROW_NUMBER() OVER (
                           PARTITION BY pp.id_perproduct
                           ORDER BY pp.start_actual DESC, pp.id_process DESC
                       ) AS rn
                FROM production_progress pp
                WHERE pp.id_perproduct IS NOT NULL
                  AND DATE(pp.start_actual) >= ?1
            ),
            ws1_start AS (
                SELECT id_perproduct, MIN(start_actual) AS first_station_start
                FROM production_progress
                WHERE workstation = 1
                  AND id_perproduct IS NOT NULL
                  AND DATE(start_actual) >= ?1
                GROUP BY id_perproduct
            )
            SELECT l.*,
                   s.first_station_start,
                   (
                       SELECT it.duration_time FROM ideal_time it
                       WHERE it.id_product = l.id_product
                         AND it.process_name = ?2
                       ORDER BY it.id
                       LIMIT 1
                   ) AS ideal_duration
            FROM latest l
            LEFT JOIN ws1_start s ON s.id_perproduct = l.id_perproduct
            WHERE l.rn = 1
            ORDER BY l.start_actual DESC, l.id_process DESC
            "#,
            cols = EVENT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_date(since_date), process_name], |row| {
                Ok(LifecycleRow {
                    event: Self::map_event_row(row)?,
                    first_station_start: read_timestamp(row, "first_station_start")?,
                    ideal_duration: read_text(row, "ideal_duration")?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    // ==========================================
    // 状态计数原始行
    // ==========================================

    fn summary_rows(&self, since: NaiveDateTime) -> RepositoryResult<Vec<SummaryRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id_perproduct, status
            FROM production_progress
            WHERE start_actual >= ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![format_timestamp(since)], |row| {
                let status = read_text(row, "status")?;
                Ok(SummaryRow {
                    unit_id: read_text(row, "id_perproduct")?,
                    signal: StageSignal::classify(status.as_deref()),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    // ==========================================
    // 统计
    // ==========================================

    fn production_stats(&self, scope: &StatsScope) -> RepositoryResult<ProductionStats> {
        let conn = self.get_conn()?;

        let (sql, values) = SqlQueryBuilder::new(
            r#"
            SELECT COUNT(*) AS total_processes,
                   COALESCE(SUM(CASE WHEN finish_actual IS NOT NULL THEN 1 ELSE 0 END), 0) AS completed,
                   COALESCE(SUM(CASE WHEN start_actual IS NOT NULL AND finish_actual IS NULL THEN 1 ELSE 0 END), 0) AS in_progress,
                   COALESCE(SUM(CASE WHEN start_actual IS NULL THEN 1 ELSE 0 END), 0) AS pending,
                   COALESCE(AVG(duration_sec_actual), 0) AS avg_duration_sec,
                   CAST(COALESCE(SUM(duration_sec_actual), 0) AS INTEGER) AS total_duration_sec
            FROM production_progress
            "#,
        )
        .filter_if("workshop = ?", scope.workshop.as_deref())
        .filter_if("line = ?", scope.line.as_deref())
        .build();

        let stats = conn.query_row(&sql, params_from_iter(values), |row| {
            Ok(ProductionStats {
                total_processes: row.get::<_, i64>("total_processes")? as u64,
                completed: row.get::<_, i64>("completed")? as u64,
                in_progress: row.get::<_, i64>("in_progress")? as u64,
                pending: row.get::<_, i64>("pending")? as u64,
                avg_duration_sec: row.get("avg_duration_sec")?,
                total_duration_sec: row.get("total_duration_sec")?,
            })
        })?;

        Ok(stats)
    }

    fn workstation_stats(&self, line: Option<&str>) -> RepositoryResult<Vec<WorkstationStats>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            WITH scoped AS (
                SELECT * FROM production_progress
                WHERE workstation IS NOT NULL
                  AND (?1 IS NULL OR line = ?1)
            ),
            agg AS (
                SELECT workstation,
                       COUNT(*) AS total_processes,
                       COALESCE(SUM(CASE WHEN finish_actual IS NOT NULL THEN 1 ELSE 0 END), 0) AS completed,
                       COALESCE(AVG(duration_sec_actual), 0) AS avg_duration_sec
                FROM scoped
                GROUP BY workstation
            ),
            latest AS (
                SELECT workstation, operator_actual_name, product_name, id_perproduct,
                       ROW_NUMBER() OVER (
                           PARTITION BY workstation
                           ORDER BY start_actual DESC, id_process DESC
                       ) AS rn
                FROM scoped
            )
            SELECT a.workstation, a.total_processes, a.completed, a.avg_duration_sec,
                   l.operator_actual_name, l.product_name, l.id_perproduct
            FROM agg a
            LEFT JOIN latest l ON l.workstation = a.workstation AND l.rn = 1
            ORDER BY a.workstation
            "#,
        )?;

        let stats = stmt
            .query_map(params![line], |row| {
                Ok(WorkstationStats {
                    workstation: read_int(row, "workstation")?.unwrap_or_default() as i32,
                    total_processes: row.get::<_, i64>("total_processes")? as u64,
                    completed: row.get::<_, i64>("completed")? as u64,
                    avg_duration_sec: row.get("avg_duration_sec")?,
                    active_operator: read_text(row, "operator_actual_name")?,
                    product_name: read_text(row, "product_name")?,
                    unit_id: read_text(row, "id_perproduct")?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(stats)
    }

    // ==========================================
    // 事件列表
    // ==========================================

    fn recent_events(
        &self,
        today: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<ProductionEvent>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            SELECT {cols}
            FROM production_progress pp
            WHERE DATE(pp.start_actual) = ?1
            ORDER BY pp.start_actual DESC, pp.id_process DESC
            LIMIT ?2
            "#,
            cols = EVENT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![format_date(today), limit as i64], Self::map_event_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(events)
    }

    fn list_events(&self, filter: &ProgressFilter) -> RepositoryResult<Vec<ProductionEvent>> {
        let conn = self.get_conn()?;

        let mut limit = filter.limit.clamp(1, ProgressFilter::MAX_LIMIT);
        let mut builder = SqlQueryBuilder::new(&format!(
            "SELECT {} FROM production_progress pp",
            EVENT_COLUMNS
        ));

        if let Some(term) = filter.search_term() {
            let like = Value::Text(format!("%{}%", term));
            builder = builder.filter(
                "(pp.project_name LIKE ? OR pp.product_name LIKE ? \
                 OR pp.operator_actual_name LIKE ? OR pp.process_name LIKE ?)",
                vec![like.clone(), like.clone(), like.clone(), like],
            );
            limit = limit.min(ProgressFilter::SEARCH_CAP);
        }

        let (sql, values) = builder
            .filter_if("pp.workshop = ?", filter.workshop.as_deref())
            .filter_if("pp.line = ?", filter.line.as_deref())
            .order_by("pp.start_actual DESC, pp.id_process DESC")
            .limit(limit)
            .build();

        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params_from_iter(values), Self::map_event_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(events)
    }

    fn workstation_durations(
        &self,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<WorkstationDuration>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT workstation, duration_time_actual
            FROM production_progress
            WHERE DATE(start_actual) = ?
              AND workstation IS NOT NULL
            ORDER BY workstation, start_actual DESC, id_process DESC
            "#,
        )?;

        let durations = stmt
            .query_map(params![format_date(today)], |row| {
                Ok(WorkstationDuration {
                    workstation: read_int(row, "workstation")?.unwrap_or_default() as i32,
                    actual_duration: read_text(row, "duration_time_actual")?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(durations)
    }

    // ==========================================
    // 预计完工
    // ==========================================

    fn production_estimate(
        &self,
        today: NaiveDate,
        process_name: &str,
    ) -> RepositoryResult<Option<ProductionEstimate>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            SELECT {cols},
                   (
                       SELECT it.duration_time FROM ideal_time it
                       WHERE it.id_product = pp.id_product
                         AND it.process_name = ?2
                       ORDER BY it.id
                       LIMIT 1
                   ) AS ideal_duration
            FROM production_progress pp
            WHERE pp.workstation = 1
              AND pp.finish_actual IS NULL
              AND DATE(pp.start_actual) = ?1
            ORDER BY pp.start_actual DESC, pp.id_process DESC
            LIMIT 1
            "#,
            cols = EVENT_COLUMNS
        );

        let estimate = conn
            .query_row(&sql, params![format_date(today), process_name], |row| {
                let event = Self::map_event_row(row)?;
                Ok(ProductionEstimate {
                    product_id: event.product_id,
                    unit_id: event.unit_id,
                    product_name: event.product_name,
                    started_at: event.started_at,
                    total_duration: read_text(row, "ideal_duration")?,
                    estimated_finish: None,
                })
            })
            .optional()?;

        Ok(estimate)
    }

    // ==========================================
    // 操作工活动
    // ==========================================

    fn operator_activity(&self, today: NaiveDate) -> RepositoryResult<Vec<OperatorActivity>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            WITH todays AS (
                SELECT * FROM production_progress
                WHERE DATE(start_actual) = ?1
                  AND operator_actual_name IS NOT NULL
                  AND TRIM(operator_actual_name) <> ''
            ),
            agg AS (
                SELECT operator_actual_name AS operator_name,
                       MAX(operator_actual_rfid) AS operator_rfid,
                       COUNT(*) AS events_today,
                       COALESCE(SUM(CASE WHEN finish_actual IS NOT NULL THEN 1 ELSE 0 END), 0) AS completed_today,
                       CAST(COALESCE(SUM(duration_sec_actual), 0) AS INTEGER) AS total_duration_sec,
                       MAX(start_actual) AS last_seen_at
                FROM todays
                GROUP BY operator_actual_name
            ),
            latest AS (
                SELECT operator_actual_name, workstation,
                       ROW_NUMBER() OVER (
                           PARTITION BY operator_actual_name
                           ORDER BY start_actual DESC, id_process DESC
                       ) AS rn
                FROM todays
            )
            SELECT a.*, l.workstation AS current_workstation
            FROM agg a
            LEFT JOIN latest l ON l.operator_actual_name = a.operator_name AND l.rn = 1
            ORDER BY a.last_seen_at DESC, a.operator_name
            "#,
        )?;

        let activity = stmt
            .query_map(params![format_date(today)], |row| {
                Ok(OperatorActivity {
                    operator_rfid: read_int(row, "operator_rfid")?,
                    operator_name: read_text(row, "operator_name")?.unwrap_or_default(),
                    events_today: row.get::<_, i64>("events_today")? as u64,
                    completed_today: row.get::<_, i64>("completed_today")? as u64,
                    total_duration_sec: row.get("total_duration_sec")?,
                    last_seen_at: read_timestamp(row, "last_seen_at")?,
                    current_workstation: read_int(row, "current_workstation")?.map(|v| v as i32),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(activity)
    }

    // ==========================================
    // 排产计划
    // ==========================================

    fn pending_schedule(&self, since_date: NaiveDate) -> RepositoryResult<Vec<ScheduledUnit>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT ps.*
            FROM production_schedule ps
            WHERE NOT EXISTS (
                SELECT 1 FROM production_progress pp
                WHERE pp.id_product = ps.id_product
                  AND DATE(pp.start_actual) >= ?1
            )
            ORDER BY ps.start_schedule, ps.id
            "#,
        )?;

        let units = stmt
            .query_map(params![format_date(since_date)], Self::map_schedule_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(units)
    }

    fn events_on(&self, today: NaiveDate) -> RepositoryResult<Vec<ProductionEvent>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            SELECT {cols}
            FROM production_progress pp
            WHERE DATE(pp.start_actual) = ?1
            ORDER BY pp.start_actual DESC, pp.id_process DESC
            "#,
            cols = EVENT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![format_date(today)], Self::map_event_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(events)
    }
}
