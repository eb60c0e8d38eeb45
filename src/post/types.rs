//! Post types for rss-sum.

use chrono::{DateTime, Utc};

/// A post, either a candidate fetched this cycle or one already stored.
///
/// Before persistence `text` holds the raw item content; the pipeline
/// replaces it with the summary before the post is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Feed item GUID. Unique within a partition.
    pub id: String,
    /// Partition key derived from the feed URL.
    pub partition_key: String,
    /// Item title.
    pub title: String,
    /// Item content, or its summary once summarized.
    pub text: String,
    /// Link to the original article.
    pub source_url: String,
    /// When the item was fetched.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a post stamped with the current time.
    pub fn new(id: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: partition_key.into(),
            title: String::new(),
            text: String::new(),
            source_url: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the source URL.
    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = source_url.into();
        self
    }

    /// Set the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// One page of stored posts.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    /// Posts on this page.
    pub posts: Vec<Post>,
    /// Partition the page was read from (empty for all partitions).
    pub partition_key: String,
    /// 1-based page number.
    pub page: i64,
    /// Requested page size.
    pub page_size: i64,
    /// Total number of posts matching the filter.
    pub total_size: i64,
}

impl PostPage {
    /// Ids of the posts on this page.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.posts.iter().map(|p| p.id.as_str())
    }
}
