pub mod defs;

pub use defs::ConvertError;
pub use defs::ConvertOptions;
pub use defs::DocumentConverter;
pub use defs::FeedIngestor;
pub use defs::RawEntry;
pub use defs::ReadableExtractor;
