// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据写入等功能
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use andon_monitor::db::{ensure_schema, open_sqlite_connection};
use andon_monitor::domain::{IdealTime, ProductionEvent, ScheduledUnit};
use andon_monitor::repository::ProgressRepository;
use rusqlite::Connection;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库的共享连接
pub fn open_shared_conn(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 写入事件 / 理想工时 / 排产计划
pub fn seed_repository(
    repo: &ProgressRepository,
    events: &[ProductionEvent],
    ideal_times: &[IdealTime],
    schedule: &[ScheduledUnit],
) -> Result<(), Box<dyn Error>> {
    repo.batch_insert_events(events)?;
    for ideal in ideal_times {
        repo.insert_ideal_time(ideal)?;
    }
    for unit in schedule {
        repo.insert_schedule(unit)?;
    }
    Ok(())
}
