//! Integration tests for the periodic updater.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};

use common::{
    controller, items, worker_config, FeedBehavior, MemoryStore, RecordingClock, ScriptedSource,
    ScriptedSummarizer,
};
use rss_sum::{IntervalTicker, RssUpdater};

const FEED: &str = "https://example.com/rss";

fn updater(source: Arc<ScriptedSource>) -> RssUpdater {
    RssUpdater::new(controller(
        &worker_config(&[FEED]),
        source,
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedSummarizer::new()),
        Arc::new(RecordingClock::new()),
    ))
}

fn shutdown_on(rx: oneshot::Receiver<()>) -> impl std::future::Future<Output = ()> {
    async move {
        let _ = rx.await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_one_cycle_per_tick_and_none_at_startup() {
    let source = Arc::new(ScriptedSource::new().with(FEED, FeedBehavior::Items(items(&["g1"]))));
    let updater = updater(source.clone());
    let (tx, rx) = oneshot::channel();

    let ticker = IntervalTicker::new(Duration::from_secs(60));
    tokio::join!(updater.run(ticker, shutdown_on(rx)), async {
        sleep(Duration::from_secs(59)).await;
        assert!(source.calls().is_empty());

        // Ticks at 60s, 120s and 180s
        sleep(Duration::from_secs(151)).await;
        assert_eq!(source.calls().len(), 3);

        tx.send(()).unwrap();
    });

    assert_eq!(source.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_first_tick() {
    let source = Arc::new(ScriptedSource::new());
    let updater = updater(source.clone());
    let (tx, rx) = oneshot::channel();
    tx.send(()).unwrap();

    let start = Instant::now();
    updater
        .run(IntervalTicker::new(Duration::from_secs(60)), shutdown_on(rx))
        .await;

    assert!(source.calls().is_empty());
    assert!(start.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_between_cycles() {
    let source = Arc::new(ScriptedSource::new().with(FEED, FeedBehavior::Items(items(&["g1"]))));
    let updater = updater(source.clone());
    let (tx, rx) = oneshot::channel();

    tokio::join!(
        updater.run(IntervalTicker::new(Duration::from_secs(60)), shutdown_on(rx)),
        async {
            sleep(Duration::from_secs(90)).await;
            tx.send(()).unwrap();
        }
    );

    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_overrunning_cycle_is_not_overlapped() {
    let source = Arc::new(ScriptedSource::new().with(
        FEED,
        FeedBehavior::Slow(Duration::from_secs(150), items(&["g1"])),
    ));
    let updater = updater(source.clone());
    let (tx, rx) = oneshot::channel();
    let start = Instant::now();

    tokio::join!(
        updater.run(IntervalTicker::new(Duration::from_secs(60)), shutdown_on(rx)),
        async {
            sleep(Duration::from_secs(500)).await;
            tx.send(()).unwrap();
        }
    );

    let calls = source.calls();
    assert!(calls.len() >= 2);

    let first_start = calls[0].started.duration_since(start);
    assert!(first_start >= Duration::from_secs(60) && first_start < Duration::from_secs(61));

    // The cycle running at shutdown finishes before the updater returns
    assert!(calls.iter().all(|c| c.finished.is_some()));

    for pair in calls.windows(2) {
        let previous_end = pair[0].finished.unwrap();
        assert!(pair[1].started >= previous_end);
    }
}
