//! Background updater for rss-sum.
//!
//! Runs an ingestion cycle on every tick of a [`Ticker`] until shut down.

use std::future::Future;

use tracing::{error, info};

use crate::clock::Ticker;
use crate::rss::cycle::CycleController;

/// Periodic driver of [`CycleController`].
pub struct RssUpdater {
    controller: CycleController,
}

impl RssUpdater {
    /// Create a new updater.
    pub fn new(controller: CycleController) -> Self {
        Self { controller }
    }

    /// Run the updater loop until `shutdown` completes.
    ///
    /// Each tick runs one cycle to completion before the next tick is
    /// awaited, so cycles never overlap. Shutdown is only observed while
    /// waiting for a tick; a cycle in progress always finishes.
    pub async fn run<T, S>(&self, mut ticker: T, shutdown: S)
    where
        T: Ticker,
        S: Future<Output = ()>,
    {
        info!(
            "RSS updater started ({} feed(s))",
            self.controller.feeds().len()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("RSS updater stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.controller.run_cycle().await {
                error!("Cycle failed: {}", e);
            }
        }
    }
}
