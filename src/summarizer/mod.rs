//! Text summarization for rss-sum.

pub mod ollama;

pub use ollama::OllamaSummarizer;

use async_trait::async_trait;

use crate::Result;

/// Summarization capability consumed by the ingestion pipeline.
///
/// No length contract is enforced on the returned summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a piece of text.
    async fn summarize(&self, text: &str) -> Result<String>;
}
