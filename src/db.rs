// ==========================================
// Andon 生产监控看板 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，终端写入与看板读取并发时减少 busy 错误
// - 建表语句集中在此（列名与产线 production_progress 表一致）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号仅用于告警（不做自动迁移）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS production_progress (
    id_process INTEGER PRIMARY KEY AUTOINCREMENT,
    id_product TEXT,
    id_perproduct TEXT,
    project_name TEXT,
    product_name TEXT,
    line TEXT,
    workshop TEXT,
    process_name TEXT,
    workstation INTEGER,
    operator_actual_rfid INTEGER,
    operator_actual_name TEXT,
    start_actual TEXT,
    duration_sec_actual INTEGER,
    duration_time_actual TEXT,
    status TEXT,
    note_qc TEXT,
    finish_actual TEXT
);

CREATE INDEX IF NOT EXISTS idx_progress_ws_start
    ON production_progress (workstation, start_actual);
CREATE INDEX IF NOT EXISTS idx_progress_unit_start
    ON production_progress (id_perproduct, start_actual);

CREATE TABLE IF NOT EXISTS ideal_time (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_product TEXT NOT NULL,
    process_name TEXT,
    workstation INTEGER,
    duration_time TEXT,
    percentage REAL
);

CREATE INDEX IF NOT EXISTS idx_ideal_product
    ON ideal_time (id_product, process_name);

CREATE TABLE IF NOT EXISTS production_schedule (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_project TEXT,
    id_product TEXT,
    project TEXT,
    product TEXT,
    workshop TEXT,
    line TEXT,
    quantity INTEGER,
    start_schedule TEXT,
    finish_schedule TEXT,
    qc_schedule TEXT,
    production_progress TEXT
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等），空库写入当前 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) \
         SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
