// Terminal polling client: follows /api/production-progress/current and logs the Kanban board
// after every applied refresh, plus per-workstation elapsed timers every second.
//
// Usage:
//   cargo run --bin andon_watch -- [base_url] [days_back]
//
// base_url defaults to http://<ANDON_BIND_ADDR>; days_back must be one of 1/3/7/14/30/90/365.

use std::sync::Arc;

use anyhow::{anyhow, Context};

use andon_monitor::api::DashboardSnapshot;
use andon_monitor::client::{
    ElapsedBoard, HttpDashboardSource, PollingClient, ViewScheduler, DEFAULT_TICK_INTERVAL,
};
use andon_monitor::config::AppConfig;
use andon_monitor::domain::ToDoEntry;
use andon_monitor::engine::estimate::{self, DurationUnits};
use andon_monitor::i18n;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    andon_monitor::logging::init();

    let config = AppConfig::from_env().context("配置加载失败")?;
    let locale = config.dashboard.locale.clone();

    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .unwrap_or_else(|| format!("http://{}", config.bind_addr));

    let source = HttpDashboardSource::new(base_url.clone(), config.request_timeout)
        .map_err(|e| anyhow!("{}", e))?;
    let client = Arc::new(PollingClient::new(
        Arc::new(source),
        config.dashboard.default_days_back,
    ));

    if let Some(raw) = args.next() {
        let days: u32 = raw
            .trim()
            .parse()
            .with_context(|| format!("days_back 必须为整数: {}", raw))?;
        client.set_days_back(days).map_err(|e| anyhow!("{}", e))?;
    }

    tracing::info!(
        base_url = %base_url,
        window = %i18n::days_back_label(&locale, client.days_back().get()),
        "开始轮询看板"
    );

    // 每次应用新数据时输出看板
    let mut updates = client.subscribe();
    let board_locale = locale.clone();
    let board_logger = tokio::spawn(async move {
        let mut last_generation = 0;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if state.applied_generation == last_generation {
                continue;
            }
            last_generation = state.applied_generation;
            if let Some(snapshot) = &state.snapshot {
                log_board(snapshot, &board_locale);
            }
        }
    });

    // 每秒刷新工位计时
    let units = DurationUnits::for_locale(&locale);
    let mut elapsed = ElapsedBoard::new();
    let mut synced_generation = 0;
    let scheduler = ViewScheduler::start(
        Arc::clone(&client),
        config.poll_interval,
        DEFAULT_TICK_INTERVAL,
        move |state| {
            if let Some(snapshot) = &state.snapshot {
                if state.applied_generation != synced_generation {
                    elapsed.sync(&snapshot.workstations);
                    synced_generation = state.applied_generation;
                }
            }
            let now = chrono::Local::now().naive_local();
            for (ws, text) in elapsed.tick(now, &units) {
                tracing::debug!(workstation = ws, elapsed = %text, "计时");
            }
        },
    );

    tokio::signal::ctrl_c()
        .await
        .context("无法监听 Ctrl-C 信号")?;
    tracing::info!("收到退出信号，正在停止...");

    scheduler.stop().await;
    board_logger.abort();
    Ok(())
}

fn log_board(snapshot: &DashboardSnapshot, locale: &str) {
    let board = &snapshot.board;
    let summary = &snapshot.status_summary;

    tracing::info!(
        updated_at = %snapshot.updated_at,
        window = %i18n::days_back_label(locale, snapshot.days_back.get()),
        selesai = summary.selesai_produksi,
        on_progress = summary.on_progress,
        finish_good = summary.finish_good,
        not_ok = summary.not_ok,
        gangguan = summary.gangguan,
        tunggu = summary.tunggu,
        degraded = snapshot.degraded.len(),
        "看板已刷新"
    );

    let scheduled = board
        .to_do
        .iter()
        .filter(|e| matches!(e, ToDoEntry::Scheduled(_)))
        .count();
    tracing::info!(
        "{}={} {}={} {}={} {}={} {}={}",
        i18n::t_in(locale, "board.to_do"),
        board.to_do.len(),
        i18n::t_in(locale, "board.on_progress"),
        board.on_progress.len(),
        i18n::t_in(locale, "board.qc"),
        board.qc.len(),
        i18n::t_in(locale, "board.finish_good"),
        board.finish_good.len(),
        i18n::t_in(locale, "board.not_ok"),
        board.not_ok.len(),
    );
    tracing::debug!(scheduled, "To Do 中来自排产计划的条目");

    for card in board.finish_good.iter().chain(board.qc.iter()).chain(board.not_ok.iter()) {
        if let Some(label) = estimate::overtime_label(locale, card.overtime_seconds) {
            tracing::info!(unit_id = %card.unit_id, "{}", label);
        }
    }

    for ws in &snapshot.workstations {
        if ws.occupied {
            tracing::info!(
                workstation = ws.workstation,
                unit_id = ws.unit_id.as_deref().unwrap_or(estimate::PLACEHOLDER),
                status = ws.status.as_deref().unwrap_or(estimate::PLACEHOLDER),
                tone = ?ws.tone,
                elapsed = %ws.elapsed_display,
                "工位"
            );
        }
    }

    for event in &snapshot.abnormal {
        tracing::warn!(
            unit_id = event.unit_id.as_deref().unwrap_or(estimate::PLACEHOLDER),
            workstation = ?event.workstation,
            status = event.status.as_deref().unwrap_or(estimate::PLACEHOLDER),
            "异常"
        );
    }
}
