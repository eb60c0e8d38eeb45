//! One ingestion cycle over all configured feeds.
//!
//! Feeds are handled one after another. For each feed the controller
//! fetches the head of the feed, drops items already stored for the feed's
//! partition, summarizes the rest, and saves the summaries in one batch.
//! A failing feed never stops the cycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::clock::{Clock, Deadline, TokioClock};
use crate::config::WorkerConfig;
use crate::error::{Result, RssSumError};
use crate::hasher::{partition_key, Hasher};
use crate::post::{Post, PostStore};
use crate::retry::{retry, RetryPolicy};
use crate::rss::dedup::distinct_new_posts;
use crate::rss::fetcher::{to_candidates, FeedSource};
use crate::summarizer::Summarizer;

/// How a feed's processing ended, when it ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The feed had no items.
    Empty,
    /// Every fetched item was already stored.
    NoNewItems,
    /// New items were found but none could be summarized.
    AllSummariesFailed,
    /// This many summarized posts were saved.
    Persisted(usize),
}

/// Runs ingestion cycles.
pub struct CycleController {
    feeds: Vec<String>,
    feed_items_limit: usize,
    timeout: Duration,
    source: Arc<dyn FeedSource>,
    store: Arc<dyn PostStore>,
    summarizer: Arc<dyn Summarizer>,
    hasher: Arc<dyn Hasher>,
    clock: Arc<dyn Clock>,
    fetch_policy: RetryPolicy,
    summarize_policy: RetryPolicy,
}

impl CycleController {
    /// Create a controller for the configured feeds.
    pub fn new(
        config: &WorkerConfig,
        source: Arc<dyn FeedSource>,
        store: Arc<dyn PostStore>,
        summarizer: Arc<dyn Summarizer>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        Self {
            feeds: config.feeds.clone(),
            feed_items_limit: config.feed_items_limit,
            timeout: Duration::from_secs(config.timeout_secs),
            source,
            store,
            summarizer,
            hasher,
            clock: Arc::new(TokioClock),
            fetch_policy: RetryPolicy::FETCH,
            summarize_policy: RetryPolicy::SUMMARIZE,
        }
    }

    /// Use a different clock for retry sleeps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured feed URLs, in processing order.
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    /// Process every feed once.
    ///
    /// Returns the result of the last feed processed: an earlier feed's
    /// failure is logged but does not surface if a later feed succeeds.
    pub async fn run_cycle(&self) -> Result<()> {
        info!("Cycle started: {} feed(s)", self.feeds.len());
        let deadline = Deadline::after(self.timeout);
        let mut last_error = None;

        for url in &self.feeds {
            last_error = match self.process_feed(url, &deadline).await {
                Ok(outcome) => {
                    debug!("Feed {} done: {:?}", url, outcome);
                    None
                }
                Err(e) => {
                    error!("{}", e);
                    Some(e)
                }
            };
        }

        info!("Cycle finished");
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetch, deduplicate, summarize and save one feed.
    pub async fn process_feed(&self, url: &str, deadline: &Deadline) -> Result<FeedOutcome> {
        let source = self.source.as_ref();
        let items = retry(
            self.fetch_policy,
            self.clock.as_ref(),
            &format!("fetch feed {url}"),
            move |_| deadline.run("fetch", source.fetch(url)),
        )
        .await
        .map_err(|e| RssSumError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if items.is_empty() {
            debug!("Feed {} has no items", url);
            return Ok(FeedOutcome::Empty);
        }

        let key = partition_key(self.hasher.as_ref(), url);
        let candidates = to_candidates(items, &key, self.feed_items_limit);

        let page_size = i64::try_from(self.feed_items_limit).unwrap_or(i64::MAX);
        let stored = deadline
            .run("load posts", self.store.get_posts(1, page_size, &key))
            .await
            .map_err(|e| RssSumError::DedupLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let new_posts = distinct_new_posts(candidates, &stored.posts);
        if new_posts.is_empty() {
            debug!("Feed {} has no new items", url);
            return Ok(FeedOutcome::NoNewItems);
        }

        let summarized = self.summarize_all(new_posts, deadline).await;
        if summarized.is_empty() {
            return Ok(FeedOutcome::AllSummariesFailed);
        }

        let saved = deadline
            .run("save posts", self.store.save_posts_bulk(summarized))
            .await
            .map_err(|e| RssSumError::Persist {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        info!("Posts were updated for feed {}: {} saved", url, saved.len());
        Ok(FeedOutcome::Persisted(saved.len()))
    }

    /// Replace each post's text with its summary, dropping posts that
    /// could not be summarized.
    async fn summarize_all(&self, posts: Vec<Post>, deadline: &Deadline) -> Vec<Post> {
        let summarizer = self.summarizer.as_ref();
        let mut summarized = Vec::with_capacity(posts.len());

        for mut post in posts {
            let text = post.text.as_str();
            let result = retry(
                self.summarize_policy,
                self.clock.as_ref(),
                &format!("summarize post {}", post.source_url),
                move |_| deadline.run("summarize", summarizer.summarize(text)),
            )
            .await;

            match result {
                Ok(summary) => {
                    post.text = summary;
                    summarized.push(post);
                }
                Err(e) => {
                    let err = RssSumError::Summarize {
                        source_url: post.source_url.clone(),
                        reason: e.to_string(),
                    };
                    error!("{}", err);
                }
            }
        }

        summarized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256Hasher;
    use crate::post::PostPage;
    use crate::rss::types::FeedItem;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticSource(Vec<FeedItem>);

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<FeedItem>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        posts: Mutex<Vec<Post>>,
    }

    #[async_trait]
    impl PostStore for MemoryStore {
        async fn get_posts(&self, page: i64, page_size: i64, key: &str) -> Result<PostPage> {
            let posts: Vec<Post> = self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.partition_key == key)
                .take(page_size as usize)
                .cloned()
                .collect();
            Ok(PostPage {
                total_size: posts.len() as i64,
                posts,
                partition_key: key.to_string(),
                page,
                page_size,
            })
        }

        async fn save_posts_bulk(&self, posts: Vec<Post>) -> Result<Vec<Post>> {
            self.posts.lock().unwrap().extend(posts.iter().cloned());
            Ok(posts)
        }
    }

    struct Upper;

    #[async_trait]
    impl Summarizer for Upper {
        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    fn controller(items: Vec<FeedItem>, store: Arc<MemoryStore>) -> CycleController {
        let config = WorkerConfig {
            feeds: vec!["https://example.com/feed".to_string()],
            ..Default::default()
        };
        CycleController::new(
            &config,
            Arc::new(StaticSource(items)),
            store,
            Arc::new(Upper),
            Arc::new(Sha256Hasher::new()),
        )
    }

    #[tokio::test]
    async fn test_process_feed_outcomes() {
        let store = Arc::new(MemoryStore::default());
        let items = vec![
            FeedItem::new("g1").with_content("one"),
            FeedItem::new("g2").with_content("two"),
        ];
        let controller = controller(items, store.clone());
        let deadline = Deadline::after(Duration::from_secs(60));

        let outcome = controller
            .process_feed("https://example.com/feed", &deadline)
            .await
            .unwrap();
        assert_eq!(outcome, FeedOutcome::Persisted(2));

        let saved = store.posts.lock().unwrap().clone();
        assert_eq!(saved[0].text, "ONE");
        assert_eq!(
            saved[0].partition_key,
            Sha256Hasher::new().hash_string("https://example.com/feed")
        );

        let outcome = controller
            .process_feed("https://example.com/feed", &deadline)
            .await
            .unwrap();
        assert_eq!(outcome, FeedOutcome::NoNewItems);
    }

    #[tokio::test]
    async fn test_process_empty_feed() {
        let store = Arc::new(MemoryStore::default());
        let controller = controller(Vec::new(), store.clone());
        let deadline = Deadline::after(Duration::from_secs(60));

        let outcome = controller
            .process_feed("https://example.com/feed", &deadline)
            .await
            .unwrap();
        assert_eq!(outcome, FeedOutcome::Empty);
        assert!(store.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_cycle_ok() {
        let store = Arc::new(MemoryStore::default());
        let controller = controller(vec![FeedItem::new("g1")], store.clone());
        assert_eq!(controller.feeds().len(), 1);

        controller.run_cycle().await.unwrap();
        assert_eq!(store.posts.lock().unwrap().len(), 1);
    }
}
