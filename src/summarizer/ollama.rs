//! Summarizer backed by an Ollama server.
//!
//! Requests go to `/api/generate`; the server answers with newline-delimited
//! JSON objects whose `response` fragments are concatenated in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::Summarizer;
use crate::config::AssistantConfig;
use crate::{Result, RssSumError};

/// User agent string for summarization requests.
const USER_AGENT: &str = concat!("rss-sum/", env!("CARGO_PKG_VERSION"));

/// System instruction sent with every request.
const SYSTEM_PROMPT: &str = "Act like assistant that returns only result text. \
Result text should not contain any text formatting, sections or web links.";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    system: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
}

/// Ollama summarization client.
pub struct OllamaSummarizer {
    client: Client,
    endpoint: Url,
    model: String,
}

impl OllamaSummarizer {
    /// Create a summarizer from the assistant configuration.
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let endpoint = generate_endpoint(config)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RssSumError::Assistant(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }

    /// The URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| RssSumError::Http(format!("failed to perform request: {e}")))?;

        if !response.status().is_success() {
            return Err(RssSumError::Assistant(format!(
                "ollama API returned non-200 status code: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RssSumError::Http(format!("failed to read response: {e}")))?;

        collect_response(&body)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        debug!("Summarizing {} characters with {}", text.len(), self.model);
        self.generate(summary_prompt(text)).await
    }
}

/// Build the `/api/generate` URL from the configuration.
fn generate_endpoint(config: &AssistantConfig) -> Result<Url> {
    // IPv6 literals need brackets in a URL authority
    let host = if config.host.contains(':') && !config.host.starts_with('[') {
        format!("[{}]", config.host)
    } else {
        config.host.clone()
    };
    let base = format!("{}://{}:{}", config.scheme, host, config.port);
    let base = Url::parse(&base)
        .map_err(|e| RssSumError::Config(format!("invalid assistant address {base}: {e}")))?;
    base.join("/api/generate")
        .map_err(|e| RssSumError::Config(format!("invalid assistant address: {e}")))
}

/// Build the summarization prompt for a text.
fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following text with the following guidelines:\n\
         - Limit the summary to around 500 characters\n\
         - Capture the core message and most important points\n\
         - Write it as a brief, engaging narrative\n\
         - Preserve the tone of the original\n\
         - Ensure the summary is coherent and self-contained\n\
         - Do not include any explanation, formatting, or introduction, just return the summary text\n\
         \n\
         The text to summarize is: '{text}'"
    )
}

/// Concatenate the `response` fragments of a streamed reply.
fn collect_response(body: &str) -> Result<String> {
    let mut result = String::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let chunk: GenerateChunk = serde_json::from_str(line).map_err(|e| {
            RssSumError::Assistant(format!("failed to unmarshal part of response: {e}"))
        })?;
        result.push_str(&chunk.response);
    }

    let result = result.trim().to_string();
    if result.is_empty() {
        return Err(RssSumError::Assistant("empty summary".to_string()));
    }
    Ok(result)
}
