//! Post storage for rss-sum.
//!
//! The ingestion pipeline talks to storage through the [`PostStore`] trait;
//! [`SqlitePostStore`] is the production implementation.

pub mod repository;
pub mod types;

pub use repository::PostRepository;
pub use types::{Post, PostPage};

use async_trait::async_trait;

use crate::db::Database;
use crate::Result;

/// Storage capability consumed by the ingestion pipeline.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Load one page of stored posts for a partition.
    async fn get_posts(&self, page: i64, page_size: i64, partition_key: &str) -> Result<PostPage>;

    /// Save posts atomically: either all are saved and returned, or none.
    async fn save_posts_bulk(&self, posts: Vec<Post>) -> Result<Vec<Post>>;
}

/// [`PostStore`] backed by the SQLite database.
#[derive(Debug, Clone)]
pub struct SqlitePostStore {
    db: Database,
}

impl SqlitePostStore {
    /// Create a store over an open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn get_posts(&self, page: i64, page_size: i64, partition_key: &str) -> Result<PostPage> {
        PostRepository::new(self.db.pool())
            .get_posts(page, page_size, partition_key)
            .await
    }

    async fn save_posts_bulk(&self, posts: Vec<Post>) -> Result<Vec<Post>> {
        PostRepository::new(self.db.pool())
            .save_posts_bulk(&posts)
            .await?;
        Ok(posts)
    }
}
