// ==========================================
// Andon 生产监控看板 - 轮询客户端
// ==========================================
// 刷新规则:
// - 成功: 整体替换视图状态（空数组同样覆盖）
// - 失败: 保留上次成功的数据，记录 warn，等待下一轮（比已应用代数旧的失败不计入）
// - 乱序: 每次请求分配递增 generation，只应用比已应用更新的响应
// - 回看天数切换后，旧天数的响应一律丢弃
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::watch;

use crate::api::DashboardSnapshot;
use crate::client::error::{ClientError, ClientResult};
use crate::client::transport::DashboardSource;
use crate::domain::types::DaysBack;

// ==========================================
// RefreshGuard - 请求代数计数器
// ==========================================
#[derive(Debug, Default)]
pub struct RefreshGuard {
    issued: AtomicU64,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一次新请求，返回其 generation（从 1 开始）
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 最近登记的 generation
    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// 响应是否比已应用的数据新
    pub fn accepts(applied: u64, generation: u64) -> bool {
        generation > applied
    }
}

// ==========================================
// ViewState - 客户端视图状态
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub days_back: DaysBack,
    pub snapshot: Option<DashboardSnapshot>, // 最近一次成功应用的数据
    pub applied_generation: u64,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_success_at: Option<NaiveDateTime>,
}

impl ViewState {
    fn new(days_back: DaysBack) -> Self {
        Self {
            days_back,
            snapshot: None,
            applied_generation: 0,
            last_error: None,
            consecutive_failures: 0,
            last_success_at: None,
        }
    }
}

/// 单次刷新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 已应用
    Applied { generation: u64 },
    /// 已有更新的数据或天数已切换，丢弃
    Stale { generation: u64 },
    /// 请求失败，保留旧数据
    Failed { generation: u64 },
}

// ==========================================
// PollingClient - 轮询客户端
// ==========================================
pub struct PollingClient {
    source: Arc<dyn DashboardSource>,
    guard: RefreshGuard,
    state_tx: watch::Sender<ViewState>,
}

impl PollingClient {
    /// 创建轮询客户端
    ///
    /// # 参数
    /// - source: 看板数据源
    /// - days_back: 初始回看天数
    pub fn new(source: Arc<dyn DashboardSource>, days_back: DaysBack) -> Self {
        let (state_tx, _) = watch::channel(ViewState::new(days_back));
        Self {
            source,
            guard: RefreshGuard::new(),
            state_tx,
        }
    }

    /// 订阅视图状态变化
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_tx.subscribe()
    }

    /// 当前视图状态（克隆）
    pub fn state(&self) -> ViewState {
        self.state_tx.borrow().clone()
    }

    pub fn days_back(&self) -> DaysBack {
        self.state_tx.borrow().days_back
    }

    /// 切换回看天数（仅接受下拉选项 1/3/7/14/30/90/365）
    ///
    /// 调用方随后应触发一次 refresh
    pub fn set_days_back(&self, days: u32) -> ClientResult<DaysBack> {
        let days_back = DaysBack::from_selector(days).ok_or(ClientError::InvalidDaysBack(days))?;
        self.state_tx.send_if_modified(|state| {
            if state.days_back == days_back {
                return false;
            }
            state.days_back = days_back;
            true
        });
        tracing::info!(days_back = days_back.get(), "切换回看天数");
        Ok(days_back)
    }

    /// 拉取一次并按代数规则应用
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.guard.begin();
        let days_back = self.days_back();

        match self.source.fetch(days_back).await {
            Ok(snapshot) => self.apply(generation, days_back, snapshot),
            Err(e) => self.record_failure(generation, e),
        }
    }

    /// 记录失败（已有更新代数的数据时忽略）
    fn record_failure(&self, generation: u64, error: ClientError) -> RefreshOutcome {
        let recorded = self.state_tx.send_if_modified(|state| {
            if !RefreshGuard::accepts(state.applied_generation, generation) {
                return false;
            }
            state.last_error = Some(error.to_string());
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            true
        });

        if recorded {
            tracing::warn!(generation, error = %error, "看板刷新失败，保留上次数据");
            RefreshOutcome::Failed { generation }
        } else {
            tracing::debug!(generation, error = %error, "过期请求失败，忽略");
            RefreshOutcome::Stale { generation }
        }
    }

    fn apply(
        &self,
        generation: u64,
        requested: DaysBack,
        snapshot: DashboardSnapshot,
    ) -> RefreshOutcome {
        // 检查与写入在同一把写锁内完成
        let applied = self.state_tx.send_if_modified(|state| {
            if !RefreshGuard::accepts(state.applied_generation, generation)
                || state.days_back != requested
            {
                return false;
            }
            state.last_success_at = Some(snapshot.updated_at);
            state.snapshot = Some(snapshot);
            state.applied_generation = generation;
            state.last_error = None;
            state.consecutive_failures = 0;
            true
        });

        if applied {
            RefreshOutcome::Applied { generation }
        } else {
            tracing::debug!(generation, latest = self.guard.latest(), "丢弃过期响应");
            RefreshOutcome::Stale { generation }
        }
    }
}
