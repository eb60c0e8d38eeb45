//! Time sources used by the ingestion worker.
//!
//! The retry helper sleeps through a [`Clock`] and the updater waits on a
//! [`Ticker`], so both can be replaced by deterministic doubles in tests.
//! A [`Deadline`] bounds the network calls of one cycle.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, timeout_at, Instant, Interval, MissedTickBehavior};

use crate::{Result, RssSumError};

/// Something that can sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Sleep for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

/// Source of scheduler ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick.
    async fn tick(&mut self);
}

/// Fixed-interval ticker.
///
/// The first tick fires one full period after creation. A tick missed
/// because the previous cycle overran fires as soon as it is polled, and
/// the schedule restarts from that point.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker with the given period.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(instant_after(period), period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// The tick period.
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Roughly 30 years, far enough to never be reached.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + duration`, saturating at a far-future instant instead of
/// overflowing.
fn instant_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Point in time after which a cycle's pending operations are abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: instant_after(timeout),
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Run `operation`, failing with [`RssSumError::Timeout`] if it is still
    /// pending when the deadline passes.
    pub async fn run<T, F>(&self, what: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout_at(self.at, operation).await {
            Ok(result) => result,
            Err(_) => Err(RssSumError::Timeout(what.to_string())),
        }
    }
}
