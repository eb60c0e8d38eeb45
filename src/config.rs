//! Configuration module for rss-sum.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::{Result, RssSumError};

/// Upper bound for every configured duration (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Ingestion worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Feed URLs to subscribe to, processed in this order every cycle.
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Maximum number of items taken from the head of each feed.
    #[serde(default = "default_feed_items_limit")]
    pub feed_items_limit: usize,
    /// Interval between cycles in seconds.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Time budget of a single cycle in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_feed_items_limit() -> usize {
    3
}

fn default_interval() -> u64 {
    3600 // 1 hour
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            feed_items_limit: default_feed_items_limit(),
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Apply pending schema migrations at startup.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_db_path() -> String {
    "data/rss-sum.sqlite".to_string()
}

fn default_run_migrations() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            run_migrations: default_run_migrations(),
        }
    }
}

/// Summarization service (Ollama) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// URL scheme (http / https).
    #[serde(default = "default_assistant_scheme")]
    pub scheme: String,
    /// Host name of the Ollama server.
    #[serde(default = "default_assistant_host")]
    pub host: String,
    /// Port of the Ollama server.
    #[serde(default = "default_assistant_port")]
    pub port: u16,
    /// Model used for summarization.
    #[serde(default)]
    pub model: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,
}

fn default_assistant_scheme() -> String {
    "http".to_string()
}

fn default_assistant_host() -> String {
    "localhost".to_string()
}

fn default_assistant_port() -> u16 {
    11434
}

fn default_assistant_timeout() -> u64 {
    30
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            scheme: default_assistant_scheme(),
            host: default_assistant_host(),
            port: default_assistant_port(),
            model: String::new(),
            timeout_secs: default_assistant_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/rss-sum.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Ingestion worker configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Summarization service configuration.
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RssSumError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RssSumError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDS`: comma separated feed URLs
    /// - `FEED_ITEMS_LIMIT`, `WORKER_INTERVAL_IN_SECONDS`, `WORKER_TIMEOUT_IN_SECONDS`
    /// - `RUN_MIGRATION`
    /// - `OLLAMA_SCHEME`, `OLLAMA_HOST`, `OLLAMA_PORT`, `OLLAMA_MODEL`,
    ///   `OLLAMA_TIMEOUT_IN_SECONDS`
    /// - `RSS_SUM_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty (or whitespace-only) values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(feeds) = get("FEEDS") {
            self.worker.feeds = feeds
                .split(',')
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect();
        }
        if let Some(v) = get("FEED_ITEMS_LIMIT") {
            self.worker.feed_items_limit = parse_env("FEED_ITEMS_LIMIT", &v)?;
        }
        if let Some(v) = get("WORKER_INTERVAL_IN_SECONDS") {
            self.worker.interval_secs = parse_env("WORKER_INTERVAL_IN_SECONDS", &v)?;
        }
        if let Some(v) = get("WORKER_TIMEOUT_IN_SECONDS") {
            self.worker.timeout_secs = parse_env("WORKER_TIMEOUT_IN_SECONDS", &v)?;
        }
        if let Some(v) = get("RUN_MIGRATION") {
            self.database.run_migrations = parse_bool("RUN_MIGRATION", &v)?;
        }
        if let Some(v) = get("OLLAMA_SCHEME") {
            self.assistant.scheme = v;
        }
        if let Some(v) = get("OLLAMA_HOST") {
            self.assistant.host = v;
        }
        if let Some(v) = get("OLLAMA_PORT") {
            self.assistant.port = parse_env("OLLAMA_PORT", &v)?;
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.assistant.model = v;
        }
        if let Some(v) = get("OLLAMA_TIMEOUT_IN_SECONDS") {
            self.assistant.timeout_secs = parse_env("OLLAMA_TIMEOUT_IN_SECONDS", &v)?;
        }
        if let Some(v) = get("RSS_SUM_LOG_LEVEL") {
            self.logging.level = v;
        }

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// A configuration error here is fatal: the process does not start.
    pub fn validate(&self) -> Result<()> {
        if self.worker.feeds.is_empty() {
            return Err(RssSumError::Config(
                "no feeds configured; set [worker].feeds or the FEEDS environment variable"
                    .to_string(),
            ));
        }
        for feed in &self.worker.feeds {
            let parsed = url::Url::parse(feed)
                .map_err(|e| RssSumError::Config(format!("invalid feed URL {feed:?}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(RssSumError::Config(format!(
                    "unsupported feed URL scheme: {feed}"
                )));
            }
        }
        if self.worker.feed_items_limit == 0 {
            return Err(RssSumError::Config(
                "feed_items_limit must be a positive integer".to_string(),
            ));
        }
        if self.worker.interval_secs == 0 {
            return Err(RssSumError::Config(
                "interval_secs must be a positive integer".to_string(),
            ));
        }
        if self.worker.timeout_secs == 0 {
            return Err(RssSumError::Config(
                "timeout_secs must be a positive integer".to_string(),
            ));
        }
        for (name, secs) in [
            ("interval_secs", self.worker.interval_secs),
            ("timeout_secs", self.worker.timeout_secs),
            ("assistant timeout_secs", self.assistant.timeout_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(RssSumError::Config(format!(
                    "{name} must not exceed {MAX_DURATION_SECS} seconds"
                )));
            }
        }
        if !matches!(self.assistant.scheme.as_str(), "http" | "https") {
            return Err(RssSumError::Config(format!(
                "unsupported assistant scheme: {}",
                self.assistant.scheme
            )));
        }
        if self.assistant.host.is_empty() {
            return Err(RssSumError::Config("assistant host is empty".to_string()));
        }
        if self.assistant.model.is_empty() {
            return Err(RssSumError::Config(
                "assistant model is empty; set [assistant].model or OLLAMA_MODEL".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        RssSumError::Config(format!("failed to parse {key} environment variable: {e}"))
    })
}

/// Parse a boolean the way Go's `strconv.ParseBool` does.
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(RssSumError::Config(format!(
            "failed to parse {key} environment variable: invalid boolean {value:?}"
        ))),
    }
}
