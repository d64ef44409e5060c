//! Podcast 2.0 (`podcast:*`) extension elements.

use crate::model::{Funding, Person};
use crate::util::strip_control_chars;

use super::xml::{Ns, XmlElement};

/// Role assumed by the namespace when `podcast:person` has none.
const DEFAULT_PERSON_ROLE: &str = "host";

#[derive(Debug, Default)]
pub(crate) struct PodcastChannel {
    pub funding: Vec<Funding>,
    pub persons: Vec<Person>,
}

#[derive(Debug, Default)]
pub(crate) struct PodcastItem {
    pub chapters_url: Option<String>,
    pub transcripts: Vec<Transcript>,
    pub funding: Vec<Funding>,
    pub persons: Vec<Person>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transcript {
    pub url: String,
    pub mime_type: Option<String>,
}

impl PodcastChannel {
    pub fn from_element(channel: &XmlElement) -> Self {
        Self {
            funding: funding_list(channel),
            persons: person_list(channel),
        }
    }
}

impl PodcastItem {
    pub fn from_element(item: &XmlElement) -> Self {
        let chapters_url = item
            .child(Ns::Podcast, "chapters")
            .and_then(|c| c.attr("url"))
            .map(str::to_string);

        let transcripts = item
            .children_named(Ns::Podcast, "transcript")
            .filter_map(|t| {
                let url = t.attr("url")?;
                Some(Transcript {
                    url: url.to_string(),
                    mime_type: t.attr("type").map(str::to_string),
                })
            })
            .collect();

        Self {
            chapters_url,
            transcripts,
            funding: funding_list(item),
            persons: person_list(item),
            // podcast:season / podcast:episode may be fractional ("1.5"); keep whole numbers only
            season: item
                .child_text(Ns::Podcast, "season")
                .and_then(|s| s.parse().ok()),
            episode: item
                .child_text(Ns::Podcast, "episode")
                .and_then(|s| s.parse().ok()),
        }
    }

    /// First transcript in a subtitle format (WebVTT or SubRip).
    pub fn subtitle_transcript(&self) -> Option<&Transcript> {
        self.transcripts.iter().find(|t| t.is_subtitle())
    }
}

impl Transcript {
    fn is_subtitle(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            let mime = mime.to_ascii_lowercase();
            if mime.contains("vtt") || mime.contains("srt") || mime.contains("subrip") {
                return true;
            }
        }
        let path = self
            .url
            .split(&['?', '#'][..])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        path.ends_with(".vtt") || path.ends_with(".srt")
    }
}

fn funding_list(parent: &XmlElement) -> Vec<Funding> {
    parent
        .children_named(Ns::Podcast, "funding")
        .filter_map(|f| {
            let Some(url) = f.attr("url") else {
                tracing::debug!("Skipping podcast:funding without url attribute");
                return None;
            };
            Some(Funding {
                url: url.to_string(),
                message: f
                    .text()
                    .map(|m| strip_control_chars(m).into_owned())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

fn person_list(parent: &XmlElement) -> Vec<Person> {
    parent
        .children_named(Ns::Podcast, "person")
        .filter_map(|p| {
            let Some(name) = p.text() else {
                tracing::debug!("Skipping podcast:person without a name");
                return None;
            };
            Some(Person {
                name: strip_control_chars(name).into_owned(),
                role: p
                    .attr("role")
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_else(|| DEFAULT_PERSON_ROLE.to_string()),
                image: p.attr("img").map(str::to_string),
                href: p.attr("href").map(str::to_string),
            })
        })
        .collect()
}
