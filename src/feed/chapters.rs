//! Chapter resolution: `podcast:chapters` JSON first, shownote timestamps second.
//!
//! Resolution never fails. Any problem with the JSON source (network error,
//! non-2xx status, oversized or malformed body, zero usable chapters) drops
//! through to the shownote scan, and an episode with neither gets an empty
//! list. The two sources are never merged.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use super::error::NetworkCause;
use super::fetcher::read_limited_bytes;
use super::itunes::parse_duration;
use crate::config::ParserConfig;
use crate::model::{Chapter, ChapterSource, Episode};
use crate::util::{html_to_lines, strip_control_chars};

/// `MM:SS` or `HH:MM:SS` at the start of a line, optionally bracketed,
/// followed by a separator or whitespace and the chapter title.
#[allow(clippy::expect_used)]
static SHOWNOTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(]?(\d{1,2}(?::\d{2}){1,2})[\])]?(?:\s*[-–—:|.]\s*|\s+)(\S.*)$")
        .expect("shownote regex is valid") // Static pattern, safe to panic
});

#[derive(Debug, Error)]
enum ChapterError {
    #[error(transparent)]
    Network(#[from] NetworkCause),
    #[error("Invalid chapters JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// `{ "chapters": [...] }`; other top-level fields (version, author...) are ignored.
#[derive(Debug, Deserialize)]
struct ChaptersDocument {
    chapters: Vec<JsonChapter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonChapter {
    start_time: f64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChapterResolver {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl ChapterResolver {
    pub fn new(client: reqwest::Client, config: &ParserConfig) -> Self {
        Self {
            client,
            timeout: config.chapter_timeout(),
            max_bytes: config.max_chapters_bytes,
        }
    }

    /// Resolves chapters for one episode. Returns an empty list when neither
    /// source yields any.
    pub async fn resolve(&self, episode: &Episode) -> Vec<Chapter> {
        if let Some(url) = episode.chapters_url.as_deref() {
            match self.fetch_json_chapters(url).await {
                Ok(chapters) if !chapters.is_empty() => return chapters,
                Ok(_) => {
                    tracing::debug!(url = %url, "Chapters JSON has no chapters, using shownotes");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Chapters JSON unavailable, using shownotes");
                }
            }
        }

        episode
            .description
            .as_deref()
            .map(parse_shownote_chapters)
            .unwrap_or_default()
    }

    /// Single attempt; one deadline covers the request and the body read.
    async fn fetch_json_chapters(&self, url: &str) -> Result<Vec<Chapter>, ChapterError> {
        let bytes = tokio::time::timeout(self.timeout, self.download(url))
            .await
            .map_err(|_| NetworkCause::Timeout(self.timeout))??;

        Ok(parse_json_chapters(&bytes)?)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkCause> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(NetworkCause::HttpStatus(response.status().as_u16()));
        }
        read_limited_bytes(response, self.max_bytes).await
    }
}

fn parse_json_chapters(bytes: &[u8]) -> Result<Vec<Chapter>, serde_json::Error> {
    let document: ChaptersDocument = serde_json::from_slice(bytes)?;

    let chapters = document
        .chapters
        .into_iter()
        .filter_map(|c| {
            if !c.start_time.is_finite() || c.start_time < 0.0 {
                tracing::debug!(start_time = c.start_time, "Skipping chapter with invalid startTime");
                return None;
            }
            Some(Chapter {
                title: c
                    .title
                    .map(|t| strip_control_chars(t.trim()).into_owned())
                    .unwrap_or_default(),
                start_time: c.start_time.floor() as u64,
                image: non_blank(c.img),
                url: non_blank(c.url),
                source: ChapterSource::Json,
            })
        })
        .collect();

    Ok(chapters)
}

/// Extracts chapters from timestamp-prefixed shownote lines.
///
/// ```
/// use podfeed::feed::parse_shownote_chapters;
///
/// let chapters = parse_shownote_chapters("<p>00:00 Intro</p><p>05:30 Interview</p>");
/// assert_eq!(chapters.len(), 2);
/// assert_eq!(chapters[1].start_time, 330);
/// assert_eq!(chapters[1].title, "Interview");
/// ```
pub fn parse_shownote_chapters(description: &str) -> Vec<Chapter> {
    html_to_lines(description)
        .iter()
        .filter_map(|line| {
            let caps = SHOWNOTE_LINE.captures(line)?;
            let start_time = parse_duration(&caps[1])?;
            let title = caps[2].trim();
            if title.is_empty() {
                return None;
            }
            Some(Chapter {
                title: strip_control_chars(title).into_owned(),
                start_time,
                image: None,
                url: None,
                source: ChapterSource::Shownote,
            })
        })
        .collect()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
