//! Podcast feed ingestion.
//!
//! Fetches RSS feeds over HTTP (conditional requests, retries), maps RSS 2.0
//! plus the `itunes:` and `podcast:` namespaces into [`Feed`], resolves
//! episode chapters and validates the result.

pub mod config;
pub mod feed;
pub mod model;
pub mod util;

pub use config::{ConfigError, ParserConfig};
pub use feed::{validate_feed, CacheStats, FeedError, FeedParser, NetworkCause, NetworkError};
pub use model::{Chapter, ChapterSource, Episode, Feed, Funding, Person, ValidationResult};
