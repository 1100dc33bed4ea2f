use feed_rs::parser;
use interfaces::{FeedIngestor, RawEntry};
use tracing::{debug, warn};

/// Normalizes RSS, Atom and JSON Feed documents through `feed-rs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> RawEntry {
        let link = entry.links.into_iter().next().map(|l| l.href);
        let title = entry.title.map(|t| t.content);
        let author = entry.authors.into_iter().next().map(|a| a.name);

        // Some feeds only carry an update stamp
        let published_at = entry.published.or(entry.updated);

        // Prefer the short summary; fall back to inline content
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        RawEntry {
            link,
            title,
            author,
            published_at,
            summary,
        }
    }
}

impl FeedIngestor for FeedParser {
    fn parse(&self, raw: &[u8]) -> Vec<RawEntry> {
        debug!("Parsing feed content ({} bytes)", raw.len());

        let feed = match parser::parse(raw) {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Failed to parse feed: {}", e);
                return Vec::new();
            }
        };

        let entries: Vec<RawEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();
        debug!("Parsed feed with {} entries", entries.len());
        entries
    }
}
