//! Parser configuration, optionally loaded from a TOML file.
//!
//! The file is optional; a missing file yields `ParserConfig::default()`.
//! Unknown keys are ignored by serde but logged as warnings so typos surface.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Options recognised by [`FeedParser`](crate::feed::FeedParser).
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Deadline for a single HTTP attempt, in milliseconds.
    pub timeout_ms: u64,

    /// Additional attempts after the first transport failure.
    pub retry_attempts: u32,

    /// When false the cache is neither read nor written.
    pub enable_caching: bool,

    /// Base delay between transport retries, doubled per attempt. 0 = no delay.
    pub retry_delay_ms: u64,

    /// Deadline for the single chapter JSON request.
    pub chapter_timeout_ms: u64,

    /// Maximum feed body size in bytes.
    pub max_feed_bytes: usize,

    /// Maximum chapter JSON body size in bytes.
    pub max_chapters_bytes: usize,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            retry_attempts: 3,
            enable_caching: true,
            retry_delay_ms: 1_000,
            chapter_timeout_ms: 5_000,
            max_feed_bytes: 10 * 1024 * 1024,
            max_chapters_bytes: 1024 * 1024,
            user_agent: format!("podfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ParserConfig {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "timeout_ms",
        "retry_attempts",
        "enable_caching",
        "retry_delay_ms",
        "chapter_timeout_ms",
        "max_feed_bytes",
        "max_chapters_bytes",
        "user_agent",
    ];

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn chapter_timeout(&self) -> Duration {
        Duration::from_millis(self.chapter_timeout_ms)
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(ParserConfig::default())`
    /// - Empty file → `Ok(ParserConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: ParserConfig = toml::from_str(content)?;
        tracing::info!(
            timeout_ms = config.timeout_ms,
            retry_attempts = config.retry_attempts,
            enable_caching = config.enable_caching,
            "Loaded parser configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
