//! Feed retrieval.
//!
//! [`HttpFeedSource`] downloads and parses RSS/Atom/JSON feeds with size and
//! time limits; [`to_candidates`] turns parsed items into posts awaiting
//! summarization.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;

use crate::error::{Result, RssSumError};
use crate::post::Post;
use crate::rss::types::{FeedItem, MAX_FEED_SIZE};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total timeout in seconds.
const TOTAL_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("rss-sum/", env!("CARGO_PKG_VERSION"), " (feed fetcher)");

/// Feed retrieval capability consumed by the ingestion pipeline.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch a feed and return its items in feed order.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>>;
}

/// Feed source over HTTP.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    /// Create a new source with default settings.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RssSumError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RssSumError::Http(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RssSumError::Http(format!(
                "unexpected status: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_SIZE {
                return Err(RssSumError::Rss(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, MAX_FEED_SIZE
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RssSumError::Http(format!("failed to read response: {}", e)))?;

        // Chunked responses carry no content length
        if bytes.len() as u64 > MAX_FEED_SIZE {
            return Err(RssSumError::Rss(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_FEED_SIZE
            )));
        }

        parse_feed(&bytes)
    }
}

/// Check that a feed URL is an absolute http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| RssSumError::Rss(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RssSumError::Rss(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(RssSumError::Rss("URL has no host".to_string()));
    }

    Ok(())
}

/// Build the candidate posts for one feed.
///
/// Keeps the first `limit` items in feed order. Every candidate is stamped
/// with the same fetch time and carries the raw content as its text.
pub fn to_candidates(items: Vec<FeedItem>, partition_key: &str, limit: usize) -> Vec<Post> {
    let fetched_at = Utc::now();
    items
        .into_iter()
        .take(limit)
        .map(|item| {
            Post::new(item.guid, partition_key)
                .with_title(item.title)
                .with_text(item.content)
                .with_source_url(item.link)
                .with_created_at(fetched_at)
        })
        .collect()
}

/// Parse feed bytes into items.
fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| RssSumError::Rss(format!("failed to parse feed: {}", e)))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let content = entry
                .content
                .and_then(|c| c.body)
                .or(entry.summary.map(|t| t.content))
                .map(|body| strip_html(&body))
                .unwrap_or_default();

            FeedItem {
                guid: entry.id,
                link,
                title,
                content,
            }
        })
        .collect();

    Ok(items)
}

/// Strip HTML tags from text.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' => {
                if in_entity {
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                }
                in_tag = true;
                // Tags separate words
                result.push(' ');
            }
            '>' => in_tag = false,
            '&' if !in_tag => {
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                push_entity(&mut result, &entity);
            }
            _ if in_entity => {
                entity.push(ch);
            }
            _ if !in_tag => {
                result.push(ch);
            }
            _ => {}
        }
    }

    // A dangling '&' is literal text
    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Append the decoded form of a named or numeric entity.
fn push_entity(out: &mut String, entity: &str) {
    match entity {
        "amp" => out.push('&'),
        "lt" => out.push('<'),
        "gt" => out.push('>'),
        "quot" => out.push('"'),
        "apos" => out.push('\''),
        "nbsp" => out.push(' '),
        _ => match parse_numeric_entity(entity).and_then(char::from_u32) {
            Some(c) => out.push(c),
            None => {
                out.push('&');
                out.push_str(entity);
                out.push(';');
            }
        },
    }
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    }
}
