use chrono::{DateTime, Utc};
use interfaces::RawEntry;
use serde::Deserialize;

/// Author recorded when a feed names nobody.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    UsedSummary,
    Fetched,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub body: String,
    pub fetch_status: FetchStatus,
}

impl Article {
    /// Build an article from a feed entry. Entries without a link or a title
    /// are not articles and yield `None`.
    pub fn from_entry(entry: RawEntry, now: DateTime<Utc>) -> Option<Self> {
        let url = entry.link?;
        let title = entry.title?;

        Some(Self {
            url,
            title,
            author: entry.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            published_at: entry.published_at.unwrap_or(now),
            body: entry.summary.unwrap_or_default(),
            fetch_status: FetchStatus::Pending,
        })
    }

    pub fn has_known_author(&self) -> bool {
        self.author != UNKNOWN_AUTHOR && !self.author.trim().is_empty()
    }

    /// Take the outcome of a full-text fetch. A failed fetch keeps the
    /// summary that was already there.
    pub fn apply_fetch(&mut self, result: FetchResult) {
        if result.status == FetchStatus::Fetched {
            self.body = result.body;
        }
        self.fetch_status = result.status;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub body: String,
    pub status: FetchStatus,
    pub http_status: Option<u16>,
}

impl FetchResult {
    pub fn fetched(body: String, http_status: u16) -> Self {
        Self {
            body,
            status: FetchStatus::Fetched,
            http_status: Some(http_status),
        }
    }

    pub fn failed(http_status: Option<u16>) -> Self {
        Self {
            body: String::new(),
            status: FetchStatus::FetchFailed,
            http_status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub referer: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            // Several publishers refuse clients that do not look like a
            // browser arriving from a search engine.
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
            referer: "https://www.google.com/".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
            max_concurrent_fetches: 8,
        }
    }
}

/// Counters gathered while a collection is ingested and fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources_read: usize,
    pub sources_failed: usize,
    pub entries_seen: usize,
    pub incomplete: usize,
    pub duplicates: usize,
    pub too_old: usize,
    pub admitted: usize,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub fetch_skipped_empty: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("feed source {url} unreachable: {reason}")]
    SourceUnreachable { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not decode {url} as {charset}")]
    Decode { url: String, charset: String },

    #[error("conversion failed: {0}")]
    Converter(#[from] interfaces::ConvertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DigestError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
