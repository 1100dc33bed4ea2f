use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;

/// One entry as read from a syndicated feed, before it becomes an article.
///
/// Every field is optional: a feed that omits or mangles a field hands it
/// over as `None` instead of failing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawEntry {
    pub link: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

pub trait FeedIngestor {
    /// Turn the raw bytes of one feed document into entries.
    /// Never fails; unreadable input yields no entries.
    fn parse(&self, raw: &[u8]) -> Vec<RawEntry>;
}

pub trait ReadableExtractor {
    /// Strip boilerplate from a full page. `None` means nothing readable was
    /// found and the caller should keep the raw page.
    fn extract(&self, html: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvertOptions {
    pub title: Option<String>,
    pub metadata_file: Option<PathBuf>,
    pub defaults_file: Option<PathBuf>,
    pub transforms: Vec<PathBuf>,
    pub extra_flags: Vec<String>,
    pub table_of_contents: bool,
    /// Date string placed in the document metadata.
    pub date: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("converter I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("converter exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

/// Turns a composed HTML document into a final artifact at `destination`.
/// Blocks until the artifact is written.
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        document: &str,
        format: &str,
        destination: &Path,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError>;
}
