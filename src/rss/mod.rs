//! RSS ingestion for rss-sum.
//!
//! This module fetches feeds, filters out items that were already stored,
//! and hands the new ones to the summarizer before saving them.

pub mod cycle;
pub mod dedup;
pub mod fetcher;
pub mod types;
pub mod updater;

pub use cycle::{CycleController, FeedOutcome};
pub use dedup::distinct_new_posts;
pub use fetcher::{to_candidates, validate_url, FeedSource, HttpFeedSource};
pub use types::{FeedItem, MAX_FEED_SIZE};
pub use updater::RssUpdater;
