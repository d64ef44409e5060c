//! Normalized podcast model produced by the feed parser.
//!
//! A [`Feed`] owns its [`Episode`]s and each episode owns its optional
//! [`Chapter`] list. Every `parse_feed` call builds a fresh graph; nothing
//! here is shared between calls except through explicit clones out of the
//! cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level podcast channel metadata plus its episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: Option<String>,
    /// Channel `<description>` only; `itunes:summary` is kept in `summary`.
    pub description: Option<String>,
    pub summary: Option<String>,
    /// URL the feed was requested from. Never taken from the XML body.
    pub url: String,
    /// Website link from the channel `<link>` element.
    pub link: Option<String>,
    /// Cover art URL.
    pub image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub explicit: bool,
    pub last_build_date: Option<DateTime<Utc>>,
    /// Channel-level `podcast:funding`. Not inherited by episodes.
    pub funding: Vec<Funding>,
    /// Channel-level `podcast:person` credits.
    pub persons: Vec<Person>,
    /// Episodes in document order.
    pub episodes: Vec<Episode>,
}

/// A single `<item>` of the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub title: Option<String>,
    pub guid: Option<String>,
    /// Shownotes text (may contain HTML).
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    /// Enclosure URL.
    pub audio_url: Option<String>,
    /// Enclosure MIME type.
    pub audio_type: Option<String>,
    /// Enclosure length in bytes, as declared by the feed.
    pub audio_length: Option<u64>,
    pub pub_date: Option<DateTime<Utc>>,
    /// Duration in whole seconds.
    pub duration: Option<u64>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub keywords: Vec<String>,
    pub explicit: bool,
    /// URL of a VTT or SRT transcript.
    pub transcript: Option<String>,
    pub funding: Vec<Funding>,
    pub persons: Vec<Person>,
    /// `podcast:chapters` JSON URL, consumed by the chapter resolver.
    pub chapters_url: Option<String>,
    /// Resolved chapters; `None` when no source produced any.
    pub chapters: Option<Vec<Chapter>>,
}

/// A `podcast:funding` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funding {
    pub url: String,
    pub message: String,
}

/// A `podcast:person` credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub role: String,
    pub image: Option<String>,
    pub href: Option<String>,
}

/// Where a chapter list came from. The two are never mixed within one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterSource {
    Json,
    Shownote,
}

impl ChapterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChapterSource::Json => "json",
            ChapterSource::Shownote => "shownote",
        }
    }
}

impl std::fmt::Display for ChapterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// Offset from the start of the episode in whole seconds.
    pub start_time: u64,
    pub image: Option<String>,
    pub url: Option<String>,
    pub source: ChapterSource,
}

/// Outcome of [`validate_feed`](crate::feed::validate_feed).
///
/// `is_valid` is true exactly when `errors` is empty; warnings never affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
