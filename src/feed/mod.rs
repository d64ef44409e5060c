//! Podcast feed ingestion: fetch, parse, resolve chapters, validate.
//!
//! - **Fetching**: HTTP GET with per-attempt timeout, transport retries and
//!   conditional requests ([`fetcher`])
//! - **Caching**: URL-keyed store of parsed feeds and their validators ([`cache`])
//! - **Mapping**: RSS + `itunes:*` + `podcast:*` XML into the model ([`mapper`])
//! - **Chapters**: JSON chapters with shownote fallback ([`chapters`])
//! - **Validation**: structural checks over a built feed ([`validator`])
//!
//! # Example
//!
//! ```ignore
//! use podfeed::{FeedParser, ParserConfig};
//!
//! let parser = FeedParser::new(ParserConfig::default())?;
//! let feed = parser.parse_feed("https://example.com/feed.xml").await?;
//! let report = parser.validate_feed(&feed);
//! ```

mod cache;
mod chapters;
mod error;
mod fetcher;
mod itunes;
mod mapper;
mod podcast;
mod rss;
mod validator;
mod xml;

pub use cache::{CacheEntry, CacheStats, CacheStore};
pub use chapters::{parse_shownote_chapters, ChapterResolver};
pub use error::{FeedError, NetworkCause, NetworkError};
pub use fetcher::{ConditionalHeaders, FetchResponse, Fetcher};
pub use itunes::{parse_duration, parse_explicit, parse_keywords};
pub use mapper::parse as parse_document;
pub use validator::validate_feed;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::config::ParserConfig;
use crate::model::{Chapter, Feed, ValidationResult};

/// Episodes whose chapter JSON is fetched at the same time.
const CHAPTER_CONCURRENCY: usize = 4;

/// Entry point: owns the fetcher, chapter resolver and cache for one configuration.
#[derive(Debug, Clone)]
pub struct FeedParser {
    config: ParserConfig,
    fetcher: Fetcher,
    chapters: ChapterResolver,
    cache: CacheStore,
}

impl FeedParser {
    /// Builds a parser with its own HTTP client and a private cache.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(config: ParserConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_client(config, client, CacheStore::new()))
    }

    /// Builds a parser that reads and writes `cache`, which may be shared.
    pub fn with_cache(config: ParserConfig, cache: CacheStore) -> Result<Self, reqwest::Error> {
        let mut parser = Self::new(config)?;
        parser.cache = cache;
        Ok(parser)
    }

    pub fn with_client(config: ParserConfig, client: reqwest::Client, cache: CacheStore) -> Self {
        Self {
            fetcher: Fetcher::new(client.clone(), &config),
            chapters: ChapterResolver::new(client, &config),
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Fetches and parses the feed at `url`.
    ///
    /// With caching enabled a previous entry's ETag/Last-Modified are sent as
    /// validators and a 304 answer returns the cached feed without
    /// re-parsing. Every 2xx parse replaces the cache entry for `url`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Network`] for transport failures (after retries) and
    ///   HTTP statuses >= 400
    /// - [`FeedError::XmlParse`] for malformed documents
    /// - [`FeedError::FeedParse`] for well-formed documents that are not RSS
    ///
    /// Chapter resolution problems never surface here.
    pub async fn parse_feed(&self, url: &str) -> Result<Feed, FeedError> {
        let cached = if self.config.enable_caching {
            self.cache.get(url)
        } else {
            None
        };
        let conditional = cached.as_ref().map(CacheEntry::conditional_headers);

        let response = self.fetcher.fetch(url, conditional.as_ref()).await?;

        if response.is_not_modified() {
            // Validators are only sent when a cached entry exists
            if let Some(entry) = cached {
                tracing::debug!(url = %url, cached_at = %entry.cached_at, "Feed not modified, using cache");
                return Ok(entry.feed);
            }
            return Err(NetworkError {
                url: url.to_string(),
                attempts: 1,
                cause: NetworkCause::UnexpectedNotModified,
            }
            .into());
        }

        let mut feed = mapper::parse(&response.body, url)?;
        self.resolve_chapters(&mut feed).await;

        tracing::info!(
            url = %url,
            title = feed.title.as_deref().unwrap_or(""),
            episodes = feed.episodes.len(),
            "Parsed feed"
        );

        if self.config.enable_caching {
            self.cache.put(
                url,
                CacheEntry {
                    url: url.to_string(),
                    etag: response.etag(),
                    last_modified: response.last_modified(),
                    feed: feed.clone(),
                    cached_at: Utc::now(),
                },
            );
        }

        Ok(feed)
    }

    /// Structural validation of an already-built feed. Never fails.
    pub fn validate_feed(&self, feed: &Feed) -> ValidationResult {
        validate_feed(feed)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn resolve_chapters(&self, feed: &mut Feed) {
        let resolved: Vec<Vec<Chapter>> = stream::iter(feed.episodes.iter())
            .map(|episode| self.chapters.resolve(episode))
            .buffered(CHAPTER_CONCURRENCY)
            .collect()
            .await;

        for (episode, chapters) in feed.episodes.iter_mut().zip(resolved) {
            episode.chapters = (!chapters.is_empty()).then_some(chapters);
        }
    }
}
