// ==========================================
// Andon 生产监控看板 - 服务主入口
// ==========================================
// 加载配置 → 打开事件存储 → 启动 HTTP 服务
// Ctrl-C 优雅退出
// ==========================================

use std::sync::Arc;

use anyhow::{anyhow, Context};

use andon_monitor::app::{build_router, AppState};
use andon_monitor::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    andon_monitor::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", andon_monitor::APP_NAME);
    tracing::info!("系统版本: {}", andon_monitor::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env().context("配置加载失败")?;
    let bind_addr = config.bind_addr;

    // 打开数据库/回放 CSV 属于阻塞操作
    let state = tokio::task::spawn_blocking(move || AppState::new(config))
        .await
        .context("AppState 初始化任务异常")?
        .map_err(|e| anyhow!("无法初始化AppState: {}", e))?;

    tracing::info!(store = state.store.label(), "AppState初始化成功");

    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", bind_addr))?;

    tracing::info!("HTTP 服务已启动: http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl-C 信号: {}", e);
        // 无法监听信号时保持运行
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在停止...");
}
