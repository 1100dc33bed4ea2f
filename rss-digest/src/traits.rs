use crate::types::{FetchResult, Result};
use async_trait::async_trait;
use interfaces::RawEntry;

/// Trait for reading the entries of one feed source.
#[async_trait]
pub trait PullFeed: Send + Sync {
    /// Read the feed at `url` and return its entries. An `Err` means the
    /// source could not be read at all.
    async fn pull(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// Trait for retrieving the full text behind an article link.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch the page at `url`. When `extract` is set the page goes through
    /// readability extraction, otherwise the raw markup is returned.
    ///
    /// Failures are reported through the status of the result, never as a
    /// panic or an error, so that siblings keep going.
    async fn fetch(&self, url: &str, extract: bool) -> FetchResult;
}
