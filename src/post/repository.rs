//! Post repository for rss-sum.

use chrono::{DateTime, SecondsFormat, Utc};

use super::types::{Post, PostPage};
use crate::db::DbPool;
use crate::{Result, RssSumError};

/// Row type for a post from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: String,
    partition_key: String,
    title: String,
    text: String,
    source_url: String,
    created_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            partition_key: row.partition_key,
            title: row.title,
            text: row.text,
            source_url: row.source_url,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get one page of posts, newest first.
    ///
    /// Posts saved in the same batch share `created_at` and keep the order
    /// they were saved in.
    ///
    /// Pages are 1-based; a page below 1 is read as page 1. An empty
    /// `partition_key` selects posts from every partition.
    pub async fn get_posts(
        &self,
        page: i64,
        page_size: i64,
        partition_key: &str,
    ) -> Result<PostPage> {
        let page = page.max(1);
        let page_size = page_size.max(0);
        let offset = (page - 1) * page_size;

        let (rows, total_size) = if partition_key.is_empty() {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                .fetch_one(self.pool)
                .await
                .map_err(|e| RssSumError::Database(e.to_string()))?;

            let rows = sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, partition_key, title, text, source_url, created_at
                FROM posts
                ORDER BY created_at DESC, rowid ASC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(page_size)
            .bind(offset)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RssSumError::Database(e.to_string()))?;

            (rows, total)
        } else {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE partition_key = $1")
                .bind(partition_key)
                .fetch_one(self.pool)
                .await
                .map_err(|e| RssSumError::Database(e.to_string()))?;

            let rows = sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, partition_key, title, text, source_url, created_at
                FROM posts
                WHERE partition_key = $1
                ORDER BY created_at DESC, rowid ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(partition_key)
            .bind(page_size)
            .bind(offset)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RssSumError::Database(e.to_string()))?;

            (rows, total)
        };

        Ok(PostPage {
            posts: rows.into_iter().map(Post::from).collect(),
            partition_key: partition_key.to_string(),
            page,
            page_size,
            total_size,
        })
    }

    /// Insert all posts in a single transaction.
    ///
    /// Either every post is saved or none is.
    pub async fn save_posts_bulk(&self, posts: &[Post]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RssSumError::Database(e.to_string()))?;

        for post in posts {
            sqlx::query(
                r#"
                INSERT INTO posts (id, partition_key, title, text, source_url, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&post.id)
            .bind(&post.partition_key)
            .bind(&post.title)
            .bind(&post.text)
            .bind(&post.source_url)
            .bind(post.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&mut *tx)
            .await
            .map_err(|e| RssSumError::Database(format!("failed to create posts: {e}")))?;
        }

        // Dropping the transaction on an early return rolls it back.
        tx.commit().await.map_err(|e| {
            RssSumError::Database(format!("failed to commit posts creation transaction: {e}"))
        })?;

        Ok(())
    }

    /// Count posts in a partition.
    pub async fn count_by_partition(&self, partition_key: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE partition_key = $1")
            .bind(partition_key)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RssSumError::Database(e.to_string()))?;
        Ok(count)
    }
}

/// Parse a datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}
