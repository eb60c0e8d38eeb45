//! RSS types for rss-sum.

/// Maximum feed body size in bytes (5 MiB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// One item parsed from a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    /// Item GUID (RSS `guid`, Atom `id`).
    pub guid: String,
    /// Link to the original article. Empty if the item has none.
    pub link: String,
    /// Item title. Empty if the item has none.
    pub title: String,
    /// Plain-text item content.
    pub content: String,
}

impl FeedItem {
    /// Create an item with the given GUID.
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            ..Default::default()
        }
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}
