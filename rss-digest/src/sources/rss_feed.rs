use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::PullFeed;
use crate::types::Result;
use async_trait::async_trait;
use interfaces::{FeedIngestor, RawEntry};
use std::sync::Arc;
use tracing::info;

/// Feed source that reads over HTTP and parses with `feed-rs`.
pub struct RssFeedSource {
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
        }
    }
}

#[async_trait]
impl PullFeed for RssFeedSource {
    async fn pull(&self, url: &str) -> Result<Vec<RawEntry>> {
        info!("Reading feed: {}", url);

        let content = self.fetcher.fetch_feed(url).await?;
        let entries = self.parser.parse(&content);

        info!("Pulled {} entries from {}", entries.len(), url);
        Ok(entries)
    }
}
