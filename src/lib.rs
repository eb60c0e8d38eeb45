//! rss-sum - RSS feed summarizer
//!
//! Periodically fetches RSS/Atom feeds, summarizes new items with a language
//! model, and stores the summaries in SQLite.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod post;
pub mod retry;
pub mod rss;
pub mod summarizer;

pub use clock::{Clock, Deadline, IntervalTicker, Ticker, TokioClock};
pub use config::Config;
pub use db::Database;
pub use error::{Result, RssSumError};
pub use hasher::{partition_key, Hasher, Sha256Hasher};
pub use post::{Post, PostPage, PostStore, SqlitePostStore};
pub use retry::{retry, RetryPolicy};
pub use rss::{CycleController, FeedItem, FeedOutcome, FeedSource, HttpFeedSource, RssUpdater};
pub use summarizer::{OllamaSummarizer, Summarizer};
