//! Test doubles for integration tests.
//!
//! Provides in-memory collaborators for the ingestion pipeline and a
//! controller builder wired to them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use rss_sum::config::WorkerConfig;
use rss_sum::{
    Clock, CycleController, FeedItem, FeedSource, Hasher, Post, PostPage, PostStore, Result,
    RssSumError, Summarizer,
};

/// Build feed items whose content and link are derived from the GUID.
pub fn items(guids: &[&str]) -> Vec<FeedItem> {
    guids
        .iter()
        .map(|guid| {
            FeedItem::new(*guid)
                .with_title(format!("Title {guid}"))
                .with_link(format!("https://example.com/{guid}"))
                .with_content(format!("text {guid}"))
        })
        .collect()
}

/// How [`ScriptedSource`] answers for one URL.
#[derive(Debug, Clone)]
pub enum FeedBehavior {
    /// Return these items.
    Items(Vec<FeedItem>),
    /// Fail every attempt.
    Fail,
    /// Never complete.
    Hang,
    /// Return these items after the given delay.
    Slow(Duration, Vec<FeedItem>),
}

/// One fetch call seen by [`ScriptedSource`].
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    pub started: Instant,
    pub finished: Option<Instant>,
}

/// Feed source answering from a per-URL script.
#[derive(Default)]
pub struct ScriptedSource {
    behaviors: Mutex<HashMap<String, FeedBehavior>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, behavior: FeedBehavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
        self
    }

    /// Replace the behavior for a URL between cycles.
    pub fn set(&self, url: &str, behavior: FeedBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.url == url).count()
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(FetchCall {
                url: url.to_string(),
                started: Instant::now(),
                finished: None,
            });
            calls.len() - 1
        };

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(FeedBehavior::Items(Vec::new()));

        let result = match behavior {
            FeedBehavior::Items(items) => Ok(items),
            FeedBehavior::Fail => Err(RssSumError::Http("connection refused".to_string())),
            FeedBehavior::Hang => std::future::pending().await,
            FeedBehavior::Slow(delay, items) => {
                tokio::time::sleep(delay).await;
                Ok(items)
            }
        };

        self.calls.lock().unwrap()[index].finished = Some(Instant::now());
        result
    }
}

/// In-memory post store recording every bulk save.
#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    saves: Mutex<Vec<Vec<Post>>>,
    fail_load: Mutex<HashSet<String>>,
    fail_save: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate stored posts.
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        self.posts.lock().unwrap().extend(posts);
        self
    }

    /// Make loading the given partition fail.
    pub fn failing_load(self, partition_key: &str) -> Self {
        self.fail_load
            .lock()
            .unwrap()
            .insert(partition_key.to_string());
        self
    }

    /// Make saving to the given partition fail.
    pub fn failing_save(self, partition_key: &str) -> Self {
        self.fail_save
            .lock()
            .unwrap()
            .insert(partition_key.to_string());
        self
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    /// Posts of each successful or failed bulk save call, in call order.
    pub fn saves(&self) -> Vec<Vec<Post>> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn get_posts(&self, page: i64, page_size: i64, partition_key: &str) -> Result<PostPage> {
        if self.fail_load.lock().unwrap().contains(partition_key) {
            return Err(RssSumError::Database("database is locked".to_string()));
        }

        let matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.partition_key == partition_key)
            .cloned()
            .collect();
        let offset = ((page.max(1) - 1) * page_size) as usize;

        Ok(PostPage {
            total_size: matching.len() as i64,
            posts: matching
                .into_iter()
                .skip(offset)
                .take(page_size as usize)
                .collect(),
            partition_key: partition_key.to_string(),
            page,
            page_size,
        })
    }

    async fn save_posts_bulk(&self, posts: Vec<Post>) -> Result<Vec<Post>> {
        self.saves.lock().unwrap().push(posts.clone());

        let failing = self.fail_save.lock().unwrap();
        if posts.iter().any(|p| failing.contains(&p.partition_key)) {
            return Err(RssSumError::Database("disk I/O error".to_string()));
        }
        drop(failing);

        self.posts.lock().unwrap().extend(posts.iter().cloned());
        Ok(posts)
    }
}

/// Summarizer that fails for chosen texts and counts calls per text.
#[derive(Default)]
pub struct ScriptedSummarizer {
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every attempt to summarize `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn calls_for(&self, text: &str) -> usize {
        self.calls.lock().unwrap().get(text).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(text.to_string())
            .or_default() += 1;

        if self.failing.contains(text) {
            return Err(RssSumError::Assistant("model not loaded".to_string()));
        }
        Ok(format!("summary of {text}"))
    }
}

/// Hasher producing readable keys.
pub struct PrefixHasher;

impl Hasher for PrefixHasher {
    fn hash_string(&self, text: &str) -> String {
        format!("key:{text}")
    }
}

/// Partition key [`PrefixHasher`] assigns to a feed URL.
pub fn key(url: &str) -> String {
    PrefixHasher.hash_string(url)
}

/// Clock that records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Worker configuration for the given feeds with default limits.
pub fn worker_config(feeds: &[&str]) -> WorkerConfig {
    WorkerConfig {
        feeds: feeds.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    }
}

/// Controller wired to the given doubles.
pub fn controller(
    config: &WorkerConfig,
    source: Arc<ScriptedSource>,
    store: Arc<MemoryStore>,
    summarizer: Arc<ScriptedSummarizer>,
    clock: Arc<RecordingClock>,
) -> CycleController {
    CycleController::new(config, source, store, summarizer, Arc::new(PrefixHasher))
        .with_clock(clock)
}
