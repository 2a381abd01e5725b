use crate::domain::progress::{IdealTime, ProductionEvent, ScheduledUnit};
use crate::domain::types::StageSignal;
use crate::repository::db_utils::{format_timestamp, read_int, read_text, read_timestamp};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// production_progress 查询列
pub(super) const EVENT_COLUMNS: &str = r#"
    pp.id_process, pp.id_product, pp.id_perproduct, pp.project_name, pp.product_name,
    pp.line, pp.workshop, pp.process_name, pp.workstation,
    pp.operator_actual_rfid, pp.operator_actual_name,
    pp.start_actual, pp.duration_sec_actual, pp.duration_time_actual,
    pp.status, pp.note_qc, pp.finish_actual
"#;

// ==========================================
// ProgressRepository - 生产进度仓储
// ==========================================
// 红线: Repository 不做业务逻辑，只做数据映射
pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressRepository {
    /// 创建新的生产进度仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作（仅供导入工具与测试）
    // ==========================================

    /// 插入生产事件
    ///
    /// # 参数
    /// - `event`: id_process 为 0 时由数据库自增分配
    ///
    /// # 返回
    /// - `Ok(id_process)`: 实际写入的主键
    pub fn insert_event(&self, event: &ProductionEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_event_with(&conn, event)?;
        Ok(conn.last_insert_rowid())
    }

    /// 批量插入生产事件（单事务）
    pub fn batch_insert_events(&self, events: &[ProductionEvent]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for event in events {
            Self::insert_event_with(&tx, event)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    fn insert_event_with(conn: &Connection, event: &ProductionEvent) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO production_progress (
                id_process, id_product, id_perproduct, project_name, product_name,
                line, workshop, process_name, workstation,
                operator_actual_rfid, operator_actual_name,
                start_actual, duration_sec_actual, duration_time_actual,
                status, note_qc, finish_actual
            ) VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                event.id_process,
                event.product_id,
                event.unit_id,
                event.project_name,
                event.product_name,
                event.line,
                event.workshop,
                event.process_name,
                event.workstation,
                event.operator_rfid,
                event.operator_name,
                event.started_at.map(format_timestamp),
                event.duration_seconds,
                event.duration_formatted,
                event.status,
                event.qc_note,
                event.finished_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    /// 插入理想工时
    pub fn insert_ideal_time(&self, ideal: &IdealTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ideal_time (id_product, process_name, workstation, duration_time, percentage)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                ideal.product_id,
                ideal.process_name,
                ideal.workstation,
                ideal.duration_time,
                ideal.percentage,
            ],
        )?;
        Ok(())
    }

    /// 插入排产计划
    pub fn insert_schedule(&self, unit: &ScheduledUnit) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_schedule (
                id, id_project, id_product, project, product, workshop, line, quantity,
                start_schedule, finish_schedule, qc_schedule, production_progress
            ) VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                unit.id,
                unit.project_id,
                unit.product_id,
                unit.project,
                unit.product,
                unit.workshop,
                unit.line,
                unit.quantity,
                unit.start_schedule.map(format_timestamp),
                unit.finish_schedule.map(format_timestamp),
                unit.qc_schedule.map(format_timestamp),
                unit.progress_note,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ==========================================
    // 行映射
    // ==========================================

    /// production_progress 行 → ProductionEvent（按列名读取）
    pub(super) fn map_event_row(row: &Row<'_>) -> rusqlite::Result<ProductionEvent> {
        let status = read_text(row, "status")?;
        let signal = StageSignal::classify(status.as_deref());

        Ok(ProductionEvent {
            id_process: row.get("id_process")?,
            product_id: read_text(row, "id_product")?,
            unit_id: read_text(row, "id_perproduct")?,
            project_name: read_text(row, "project_name")?,
            product_name: read_text(row, "product_name")?,
            line: read_text(row, "line")?,
            workshop: read_text(row, "workshop")?,
            process_name: read_text(row, "process_name")?,
            workstation: read_int(row, "workstation")?.map(|v| v as i32),
            operator_rfid: read_int(row, "operator_actual_rfid")?,
            operator_name: read_text(row, "operator_actual_name")?,
            started_at: read_timestamp(row, "start_actual")?,
            finished_at: read_timestamp(row, "finish_actual")?,
            duration_seconds: read_int(row, "duration_sec_actual")?,
            duration_formatted: read_text(row, "duration_time_actual")?,
            status,
            qc_note: read_text(row, "note_qc")?,
            signal,
        })
    }

    /// production_schedule 行 → ScheduledUnit
    pub(super) fn map_schedule_row(row: &Row<'_>) -> rusqlite::Result<ScheduledUnit> {
        Ok(ScheduledUnit {
            id: row.get("id")?,
            project_id: read_text(row, "id_project")?,
            product_id: read_text(row, "id_product")?,
            project: read_text(row, "project")?,
            product: read_text(row, "product")?,
            workshop: read_text(row, "workshop")?,
            line: read_text(row, "line")?,
            quantity: read_int(row, "quantity")?,
            start_schedule: read_timestamp(row, "start_schedule")?,
            finish_schedule: read_timestamp(row, "finish_schedule")?,
            qc_schedule: read_timestamp(row, "qc_schedule")?,
            progress_note: read_text(row, "production_progress")?,
        })
    }
}
