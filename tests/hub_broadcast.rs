mod common;
use crate::common::{RecordingRefresher, init_tracing, start_manual_hub, with_timeout};

use std::time::Duration;

use corewatch::errors::CoreWatchError;
use corewatch::hub::{HubOptions, HubStatus};
use corewatch::types::{EventFilter, EventKind};
use corewatch::watch::RawOp;

fn options(queue_capacity: usize) -> HubOptions {
    HubOptions {
        queue_capacity,
        ..HubOptions::default()
    }
}

#[tokio::test]
async fn test_unsubscribe_isolation() {
    init_tracing();
    let refresher = RecordingRefresher::new([1]);
    let (mut hub, watcher) = start_manual_hub(refresher.shared(), options(16));

    let mut s1 = hub.subscribe(EventFilter::all()).await.unwrap();
    let mut s2 = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.emit(RawOp::Create).await;
    let e1 = with_timeout(s1.recv()).await.unwrap();
    assert_eq!(e1.sequence, 1);
    assert_eq!(with_timeout(s2.recv()).await.unwrap(), e1);

    assert!(s1.unsubscribe().await);

    watcher.emit(RawOp::Write).await;
    let e2 = with_timeout(s2.recv()).await.unwrap();
    assert_eq!(e2.sequence, 2);

    // S1 saw exactly [E1] and is now at end-of-stream.
    assert_eq!(with_timeout(s1.recv()).await, None);
    assert!(s1.is_closed());

    hub.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribe_twice_is_noop() {
    init_tracing();
    let (mut hub, _watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(16));

    let sub = hub.subscribe(EventFilter::all()).await.unwrap();
    assert!(hub.unsubscribe(sub.id()).await);
    assert!(!hub.unsubscribe(sub.id()).await);

    hub.shutdown().await;
    // After shutdown the subscription is gone either way.
    assert!(!sub.unsubscribe().await);
}

#[tokio::test]
async fn test_other_ops_produce_no_events() {
    init_tracing();
    let refresher = RecordingRefresher::new([1]);
    let (mut hub, watcher) = start_manual_hub(refresher.shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    for _ in 0..5 {
        watcher.emit(RawOp::Other).await;
    }
    watcher.emit(RawOp::Remove).await;

    let first = with_timeout(sub.recv()).await.unwrap();
    assert_eq!(first.sequence, 1, "Other ops must not consume sequence numbers");
    assert_eq!(refresher.calls(), 1, "Other ops must not trigger a refresh");
    assert!(sub.is_empty());

    hub.shutdown().await;
}

#[tokio::test]
async fn test_slow_consumer_does_not_delay_others() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(4));

    let slow = hub.subscribe(EventFilter::all()).await.unwrap();
    let mut fast = hub.subscribe(EventFilter::all()).await.unwrap();

    // The fast consumer keeps up with every event while the slow one never reads.
    let mut received = Vec::new();
    for _ in 0..10 {
        watcher.emit(RawOp::Create).await;
        let n = with_timeout(fast.recv()).await.unwrap();
        received.push(n.sequence);
    }
    assert_eq!(received, (1..=10).collect::<Vec<_>>());
    assert_eq!(fast.dropped(), 0);

    assert_eq!(slow.len(), 4);
    assert_eq!(slow.dropped(), 6);

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.events_emitted, 10);
    let slow_stats = stats
        .subscriptions
        .iter()
        .find(|s| s.id == slow.id())
        .unwrap();
    assert_eq!(slow_stats.queued, 4);
    assert_eq!(slow_stats.dropped, 6);

    hub.shutdown().await;
}

#[tokio::test]
async fn test_slow_consumer_keeps_newest_notifications() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(3));

    let mut slow = hub.subscribe(EventFilter::all()).await.unwrap();
    watcher.emit_creates(7).await;

    with_timeout(async {
        while hub.stats().await.unwrap().events_emitted < 7 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    let mut kept = Vec::new();
    while let Some(n) = slow.try_recv() {
        kept.push(n.sequence);
    }
    assert_eq!(kept, vec![5, 6, 7]);
    assert_eq!(slow.dropped(), 4);

    hub.shutdown().await;
}

#[tokio::test]
async fn test_overlapping_filters_observe_same_order() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(32));

    let mut a = hub.subscribe(EventFilter::all()).await.unwrap();
    let mut b = hub
        .subscribe(EventFilter::only([EventKind::CoreChanged]))
        .await
        .unwrap();

    for op in [RawOp::Create, RawOp::Write, RawOp::Rename, RawOp::Remove] {
        watcher.emit(op).await;
    }

    let mut seen_a = Vec::new();
    let mut seen_b = Vec::new();
    for _ in 0..4 {
        seen_a.push(with_timeout(a.recv()).await.unwrap().sequence);
    }
    for _ in 0..4 {
        seen_b.push(with_timeout(b.recv()).await.unwrap().sequence);
    }
    assert_eq!(seen_a, vec![1, 2, 3, 4]);
    assert_eq!(seen_a, seen_b);

    hub.shutdown().await;
}

#[tokio::test]
async fn test_refresh_completes_before_event_is_observable() {
    init_tracing();
    let refresher = RecordingRefresher::with_delay([1, 2], Duration::from_millis(100));
    let (mut hub, watcher) = start_manual_hub(refresher.shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.emit(RawOp::Create).await;

    // Nothing is queued while the refresh is still running.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(sub.is_empty());

    let n = with_timeout(sub.recv()).await.unwrap();
    assert_eq!(n.sequence, 1);
    assert_eq!(refresher.calls(), 1);

    let seen = refresher.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 2, "refresh receives the current instance set");

    hub.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hub_task_refreshes_on_multi_thread_runtime() {
    init_tracing();
    let refresher = RecordingRefresher::with_delay([1], Duration::from_millis(20));
    let (mut hub, watcher) = start_manual_hub(refresher.shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    // The hub task may move between workers while a refresh is in flight.
    let emitter = tokio::spawn(async move {
        watcher.emit_creates(3).await;
        watcher
    });

    for expected in 1..=3 {
        assert_eq!(with_timeout(sub.recv()).await.unwrap().sequence, expected);
    }
    assert_eq!(refresher.calls(), 3);

    let _watcher = with_timeout(emitter).await.unwrap();
    hub.shutdown().await;
}

#[tokio::test]
async fn test_refresh_failure_does_not_suppress_notification() {
    init_tracing();
    let refresher = RecordingRefresher::new([1]);
    refresher.set_failing(true);
    let (mut hub, watcher) = start_manual_hub(refresher.shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.emit(RawOp::Write).await;

    let n = with_timeout(sub.recv()).await.unwrap();
    assert_eq!(n.kind(), EventKind::CoreChanged);
    assert_eq!(refresher.calls(), 1);
    assert!(hub.is_available());

    hub.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_sessions_and_rejects_subscribe() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(16));
    let handle = hub.handle();
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.emit(RawOp::Create).await;
    with_timeout(sub.recv()).await.unwrap();

    hub.shutdown().await;

    assert_eq!(with_timeout(sub.recv()).await, None);
    assert_eq!(hub.status(), HubStatus::ShutDown);
    assert_eq!(watcher.stop_calls(), 1);
    assert!(matches!(
        handle.subscribe(EventFilter::all()).await,
        Err(CoreWatchError::HubShutDown)
    ));

    // Repeat shutdown is a no-op.
    hub.shutdown().await;
    assert_eq!(watcher.stop_calls(), 1);
}

#[tokio::test]
async fn test_shutdown_delivers_pending_before_end_of_stream() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();
    let mut observer = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.emit_creates(2).await;
    with_timeout(observer.recv()).await.unwrap();
    with_timeout(observer.recv()).await.unwrap();

    hub.shutdown().await;

    assert_eq!(with_timeout(sub.recv()).await.map(|n| n.sequence), Some(1));
    assert_eq!(with_timeout(sub.recv()).await.map(|n| n.sequence), Some(2));
    assert_eq!(with_timeout(sub.recv()).await, None);
}

#[tokio::test]
async fn test_watcher_failure_degrades_hub() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(16));
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    watcher.fail("inotify queue overflow").await;

    // Existing sessions see a clean end-of-stream.
    assert_eq!(with_timeout(sub.recv()).await, None);

    assert_eq!(
        hub.status(),
        HubStatus::Degraded("inotify queue overflow".to_string())
    );
    match hub.subscribe(EventFilter::all()).await {
        Err(CoreWatchError::WatcherUnavailable(reason)) => {
            assert!(reason.contains("inotify queue overflow"));
        }
        other => panic!("expected WatcherUnavailable, got {other:?}"),
    }
    assert_eq!(watcher.stop_calls(), 1);

    hub.shutdown().await;
    assert!(matches!(hub.status(), HubStatus::Degraded(_)));
}

#[tokio::test]
async fn test_source_end_shuts_hub_down() {
    init_tracing();
    let (source, stream, watcher) = common::manual_source(8);
    let mut hub = corewatch::hub::NotificationHub::with_source(
        source,
        stream,
        RecordingRefresher::new([1]).shared(),
        options(16),
    );
    let mut sub = hub.subscribe(EventFilter::all()).await.unwrap();

    // Dropping the only sender ends the raw-op stream gracefully.
    drop(watcher);

    assert_eq!(with_timeout(sub.recv()).await, None);
    assert_eq!(hub.status(), HubStatus::ShutDown);
    hub.shutdown().await;
}

#[tokio::test]
async fn test_dropped_subscription_is_pruned() {
    init_tracing();
    let (mut hub, watcher) =
        start_manual_hub(RecordingRefresher::new([1]).shared(), options(16));

    let gone = hub.subscribe(EventFilter::all()).await.unwrap();
    let mut kept = hub.subscribe(EventFilter::all()).await.unwrap();
    drop(gone);

    watcher.emit(RawOp::Create).await;
    with_timeout(kept.recv()).await.unwrap();

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.subscriptions.len(), 1);
    assert_eq!(stats.subscriptions[0].id, kept.id());

    hub.shutdown().await;
}
