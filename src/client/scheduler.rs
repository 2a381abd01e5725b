// ==========================================
// Andon 生产监控看板 - 视图调度器
// ==========================================
// 每个视图一个任务，两个节拍:
// - 轮询节拍（默认 60s）: 启动时立即刷新一次，之后按周期刷新
// - 计时节拍（1s）: 回调当前视图状态，用于刷新计时显示
// stop() 同时取消两个节拍与进行中的刷新，并等待任务退出
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::client::poller::{PollingClient, ViewState};

/// 计时节拍
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// 视图调度器
pub struct ViewScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ViewScheduler {
    /// 启动调度任务
    ///
    /// # 参数
    /// - client: 轮询客户端（刷新在独立任务中执行，慢请求不阻塞计时节拍）
    /// - poll_interval: 轮询周期
    /// - tick_interval: 计时节拍
    /// - on_tick: 每个计时节拍的回调
    pub fn start<F>(
        client: Arc<PollingClient>,
        poll_interval: Duration,
        tick_interval: Duration,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(&ViewState) + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut poll = tokio::time::interval(poll_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick = tokio::time::interval(tick_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 进行中的刷新，任务退出或被中止时随之取消
            let mut refreshes: JoinSet<()> = JoinSet::new();

            tracing::info!(
                poll_secs = poll_interval.as_secs(),
                tick_ms = tick_interval.as_millis() as u64,
                "视图调度器启动"
            );

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = poll.tick() => {
                        let client = Arc::clone(&client);
                        refreshes.spawn(async move {
                            client.refresh().await;
                        });
                    }
                    _ = tick.tick() => {
                        on_tick(&client.state());
                    }
                    Some(_) = refreshes.join_next(), if !refreshes.is_empty() => {}
                }
            }

            refreshes.abort_all();
            while refreshes.join_next().await.is_some() {}
            tracing::info!("视图调度器停止");
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// 停止两个节拍，取消进行中的刷新并等待任务退出
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "视图调度任务异常退出");
            }
        }
    }
}

impl Drop for ViewScheduler {
    fn drop(&mut self) {
        // 未调用 stop() 时直接中止任务（JoinSet 随任务释放，进行中的刷新一并中止）
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
