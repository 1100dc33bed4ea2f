pub mod collection;
pub mod config;
pub mod converter;
pub mod digest;
pub mod fetcher;
pub mod logging;
pub mod parser;
pub mod progress;
pub mod readability;
pub mod sources;
pub mod traits;
pub mod types;

pub use collection::Collection;
pub use config::{DigestConfig, ExportSettings, RunConfig};
pub use converter::PandocConverter;
pub use digest::{Digest, HTML_FORMAT};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use readability::Readability;
pub use sources::RssFeedSource;
pub use traits::{ArticleSource, PullFeed};
pub use types::*;
