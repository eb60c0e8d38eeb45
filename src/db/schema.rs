//! Database schema and migrations for rss-sum.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Summarized posts, one partition per feed
    r#"
CREATE TABLE posts (
    id              TEXT NOT NULL,           -- feed item GUID
    partition_key   TEXT NOT NULL,           -- hash of the feed URL
    title           TEXT NOT NULL,
    text            TEXT NOT NULL,           -- summary, never the raw content
    source_url      TEXT NOT NULL,
    created_at      TEXT NOT NULL,           -- RFC 3339, UTC
    PRIMARY KEY (partition_key, id)
);

CREATE INDEX idx_posts_partition_created ON posts(partition_key, created_at);
"#,
];
