// ==========================================
// 轮询客户端集成测试
// ==========================================
// 数据源由测试脚本控制: 每次 fetch 取出一个 oneshot 接收端，
// 测试决定各请求的完成顺序；调度器节拍测试使用暂停时钟
// ==========================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use andon_monitor::api::DashboardSnapshot;
use andon_monitor::client::{
    ClientError, ClientResult, DashboardSource, PollingClient, RefreshOutcome, ViewScheduler,
};
use andon_monitor::domain::DaysBack;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{oneshot, watch};

type Reply = ClientResult<DashboardSnapshot>;

struct ScriptedSource {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    requested: Mutex<Vec<DaysBack>>,
    calls: watch::Sender<usize>,
}

impl ScriptedSource {
    /// 预先登记 n 个待完成的请求
    fn with_slots(n: usize) -> (Arc<Self>, Vec<oneshot::Sender<Reply>>) {
        let mut senders = Vec::with_capacity(n);
        let mut receivers = VecDeque::with_capacity(n);
        for _ in 0..n {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            receivers.push_back(rx);
        }
        let (calls, _) = watch::channel(0);
        let source = Arc::new(Self {
            replies: Mutex::new(receivers),
            requested: Mutex::new(Vec::new()),
            calls,
        });
        (source, senders)
    }

    async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|c| *c >= n).await.unwrap();
    }

    fn call_count(&self) -> usize {
        *self.calls.borrow()
    }
}

#[async_trait]
impl DashboardSource for ScriptedSource {
    async fn fetch(&self, days_back: DaysBack) -> ClientResult<DashboardSnapshot> {
        let slot = self.replies.lock().unwrap().pop_front();
        self.requested.lock().unwrap().push(days_back);
        self.calls.send_modify(|c| *c += 1);

        match slot {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Transport("dropped".to_string()))),
            None => Err(ClientError::Transport("no scripted reply".to_string())),
        }
    }
}

fn ts(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 11)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn snapshot(days: u32, updated_at: NaiveDateTime, total: u64) -> DashboardSnapshot {
    let mut s = DashboardSnapshot::empty(DaysBack::clamped(days as i64), updated_at);
    s.stats.total_processes = total;
    s
}

#[tokio::test]
async fn test_out_of_order_response_is_dropped() {
    let (source, mut senders) = ScriptedSource::with_slots(2);
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    source.wait_for_calls(1).await;

    let second = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    source.wait_for_calls(2).await;

    let tx_second = senders.pop().unwrap();
    let tx_first = senders.pop().unwrap();

    // 后发的请求先返回
    tx_second.send(Ok(snapshot(7, ts(10, 1), 20))).unwrap();
    assert_eq!(second.await.unwrap(), RefreshOutcome::Applied { generation: 2 });

    tx_first.send(Ok(snapshot(7, ts(10, 0), 10))).unwrap();
    assert_eq!(first.await.unwrap(), RefreshOutcome::Stale { generation: 1 });

    let state = client.state();
    assert_eq!(state.applied_generation, 2);
    assert_eq!(state.snapshot.unwrap().stats.total_processes, 20);
}

#[tokio::test]
async fn test_failure_keeps_last_good_data() {
    let (source, mut senders) = ScriptedSource::with_slots(3);
    let client = PollingClient::new(source, DaysBack::clamped(7));
    senders.reverse();

    senders.pop().unwrap().send(Ok(snapshot(7, ts(9, 0), 5))).unwrap();
    assert_eq!(client.refresh().await, RefreshOutcome::Applied { generation: 1 });

    senders
        .pop()
        .unwrap()
        .send(Err(ClientError::Timeout("10s".to_string())))
        .unwrap();
    assert_eq!(client.refresh().await, RefreshOutcome::Failed { generation: 2 });

    let state = client.state();
    assert_eq!(state.snapshot.as_ref().unwrap().stats.total_processes, 5);
    assert_eq!(state.consecutive_failures, 1);
    assert!(state.last_error.is_some());
    assert_eq!(state.last_success_at, Some(ts(9, 0)));

    // 下一轮成功后清除错误
    senders.pop().unwrap().send(Ok(snapshot(7, ts(9, 1), 6))).unwrap();
    assert_eq!(client.refresh().await, RefreshOutcome::Applied { generation: 3 });
    let state = client.state();
    assert_eq!(state.consecutive_failures, 0);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_stale_failure_keeps_view_healthy() {
    let (source, mut senders) = ScriptedSource::with_slots(2);
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    source.wait_for_calls(1).await;

    let second = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    source.wait_for_calls(2).await;

    let tx_second = senders.pop().unwrap();
    let tx_first = senders.pop().unwrap();

    tx_second.send(Ok(snapshot(7, ts(10, 1), 20))).unwrap();
    assert_eq!(second.await.unwrap(), RefreshOutcome::Applied { generation: 2 });

    // 较早的请求随后失败: 已有更新数据，不计入失败
    tx_first
        .send(Err(ClientError::Timeout("10s".to_string())))
        .unwrap();
    assert_eq!(first.await.unwrap(), RefreshOutcome::Stale { generation: 1 });

    let state = client.state();
    assert_eq!(state.applied_generation, 2);
    assert!(state.last_error.is_none());
    assert_eq!(state.consecutive_failures, 0);
}

#[tokio::test]
async fn test_empty_response_replaces_previous() {
    let (source, mut senders) = ScriptedSource::with_slots(2);
    let client = PollingClient::new(source, DaysBack::clamped(7));
    senders.reverse();

    let mut busy = snapshot(7, ts(9, 0), 12);
    busy.degraded = vec!["summary_rows".to_string()];
    senders.pop().unwrap().send(Ok(busy)).unwrap();
    client.refresh().await;

    senders.pop().unwrap().send(Ok(snapshot(7, ts(9, 1), 0))).unwrap();
    client.refresh().await;

    let current = client.state().snapshot.unwrap();
    assert_eq!(current.stats.total_processes, 0);
    assert!(current.degraded.is_empty());
}

#[tokio::test]
async fn test_days_back_switch_drops_old_window() {
    let (source, mut senders) = ScriptedSource::with_slots(2);
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));
    senders.reverse();

    let old = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    source.wait_for_calls(1).await;

    assert_eq!(client.set_days_back(30).unwrap().get(), 30);

    senders.pop().unwrap().send(Ok(snapshot(7, ts(11, 0), 7))).unwrap();
    assert_eq!(old.await.unwrap(), RefreshOutcome::Stale { generation: 1 });
    assert!(client.state().snapshot.is_none());

    senders.pop().unwrap().send(Ok(snapshot(30, ts(11, 1), 30))).unwrap();
    assert_eq!(client.refresh().await, RefreshOutcome::Applied { generation: 2 });

    let requested = source.requested.lock().unwrap().clone();
    assert_eq!(requested, vec![DaysBack::clamped(7), DaysBack::clamped(30)]);
}

#[tokio::test]
async fn test_set_days_back_accepts_selector_values_only() {
    let (source, _senders) = ScriptedSource::with_slots(0);
    let client = PollingClient::new(source, DaysBack::clamped(7));

    for days in [1, 3, 7, 14, 30, 90, 365] {
        assert_eq!(client.set_days_back(days).unwrap().get(), days);
    }
    assert!(matches!(
        client.set_days_back(5),
        Err(ClientError::InvalidDaysBack(5))
    ));
    assert_eq!(client.days_back().get(), 365);
}

#[tokio::test]
async fn test_subscribers_see_applied_state() {
    let (source, mut senders) = ScriptedSource::with_slots(1);
    let client = PollingClient::new(source, DaysBack::clamped(7));
    let mut updates = client.subscribe();

    senders.pop().unwrap().send(Ok(snapshot(7, ts(8, 0), 3))).unwrap();
    client.refresh().await;

    updates.changed().await.unwrap();
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.applied_generation, 1);
    assert_eq!(state.snapshot.unwrap().stats.total_processes, 3);
}

// ==========================================
// 视图调度器
// ==========================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_polls_at_start_then_every_interval() {
    let (source, mut senders) = ScriptedSource::with_slots(1);
    senders.pop().unwrap().send(Ok(snapshot(7, ts(8, 0), 4))).unwrap();
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let scheduler = ViewScheduler::start(
        client.clone(),
        Duration::from_secs(60),
        Duration::from_secs(1),
        {
            let seen = seen.clone();
            move |state| seen.lock().unwrap().push(state.applied_generation)
        },
    );

    // t = 0.5s: 启动时立即拉取一次，计时节拍第一次触发
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(scheduler.is_running());
    assert_eq!(source.call_count(), 1);
    assert_eq!(client.state().applied_generation, 1);
    assert_eq!(seen.lock().unwrap().len(), 1);

    // t = 59.5s: 尚未到下一轮轮询，计时节拍每秒一次
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(source.call_count(), 1);
    assert_eq!(seen.lock().unwrap().len(), 60);
    assert_eq!(seen.lock().unwrap().last(), Some(&1));

    // t = 60.5s: 第二轮轮询（无脚本回复，按失败处理，保留数据）
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.call_count(), 2);
    assert_eq!(seen.lock().unwrap().len(), 61);
    let state = client.state();
    assert_eq!(state.consecutive_failures, 1);
    assert_eq!(state.snapshot.unwrap().stats.total_processes, 4);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_stop_cancels_both_cadences() {
    let (source, mut senders) = ScriptedSource::with_slots(1);
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));
    let ticks = Arc::new(Mutex::new(0usize));

    let scheduler = ViewScheduler::start(
        client.clone(),
        Duration::from_secs(60),
        Duration::from_secs(1),
        {
            let ticks = ticks.clone();
            move |_| *ticks.lock().unwrap() += 1
        },
    );
    source.wait_for_calls(1).await;
    scheduler.stop().await;
    let ticks_at_stop = *ticks.lock().unwrap();

    // 进行中的刷新已中止，回复无人接收
    let reply = senders.pop().unwrap();
    assert!(reply.send(Ok(snapshot(7, ts(12, 0), 9))).is_err());

    tokio::time::sleep(Duration::from_secs(180)).await;
    assert_eq!(source.call_count(), 1);
    assert_eq!(*ticks.lock().unwrap(), ticks_at_stop);

    let state = client.state();
    assert_eq!(state.applied_generation, 0);
    assert!(state.snapshot.is_none());
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_drop_aborts_pending_refresh() {
    let (source, mut senders) = ScriptedSource::with_slots(1);
    let client = Arc::new(PollingClient::new(source.clone(), DaysBack::clamped(7)));

    let scheduler = ViewScheduler::start(
        client.clone(),
        Duration::from_secs(60),
        Duration::from_secs(1),
        |_| {},
    );
    source.wait_for_calls(1).await;
    drop(scheduler);

    tokio::time::sleep(Duration::from_secs(120)).await;
    let reply = senders.pop().unwrap();
    assert!(reply.send(Ok(snapshot(7, ts(12, 0), 9))).is_err());
    assert_eq!(source.call_count(), 1);
    assert!(client.state().snapshot.is_none());
}
