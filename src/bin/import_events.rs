// Small dev utility: import a production_progress CSV export into the SQLite event store.
//
// Usage:
//   cargo run --bin import_events -- <csv_path> [db_path]
//
// Timestamps are normalized to "YYYY-MM-DD HH:MM:SS". Existing rows with the same
// id_process are rejected by the primary key; rows without id_process get a new one.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};

use andon_monitor::app::get_default_db_path;
use andon_monitor::db::{ensure_schema, open_sqlite_connection};
use andon_monitor::importer::load_events;
use andon_monitor::repository::ProgressRepository;

fn main() -> anyhow::Result<()> {
    andon_monitor::logging::init();

    let mut args = std::env::args().skip(1);
    let csv_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: import_events <csv_path> [db_path]"))?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    let events = load_events(&csv_path)
        .with_context(|| format!("读取 CSV 失败: {}", csv_path.display()))?;

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    ensure_schema(&conn).context("数据库建表失败")?;

    let repo = ProgressRepository::new(Arc::new(Mutex::new(conn)));
    let inserted = repo
        .batch_insert_events(&events)
        .context("写入 production_progress 失败")?;

    tracing::info!(inserted, db_path = %db_path, "事件导入完成");
    println!("inserted={}", inserted);
    Ok(())
}
