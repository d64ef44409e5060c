//! `itunes:*` extension elements and their text-format parsers.

use super::xml::{Ns, XmlElement};

#[derive(Debug, Default)]
pub(crate) struct ItunesChannel {
    pub author: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    /// Top-level `itunes:category@text` values in document order
    pub categories: Vec<String>,
    pub explicit: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ItunesItem {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub duration: Option<u64>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub explicit: bool,
    pub keywords: Vec<String>,
}

impl ItunesChannel {
    pub fn from_element(channel: &XmlElement) -> Self {
        Self {
            author: owned(channel.child_text(Ns::Itunes, "author")),
            summary: owned(channel.child_text(Ns::Itunes, "summary")),
            image: image_href(channel),
            categories: channel
                .children_named(Ns::Itunes, "category")
                .filter_map(|c| c.attr("text"))
                .map(str::to_string)
                .collect(),
            explicit: channel
                .child_text(Ns::Itunes, "explicit")
                .is_some_and(parse_explicit),
        }
    }
}

impl ItunesItem {
    pub fn from_element(item: &XmlElement) -> Self {
        let duration = item.child_text(Ns::Itunes, "duration").and_then(|raw| {
            let parsed = parse_duration(raw);
            if parsed.is_none() {
                tracing::debug!(value = %raw, "Ignoring unparseable itunes:duration");
            }
            parsed
        });

        Self {
            title: owned(item.child_text(Ns::Itunes, "title")),
            summary: owned(item.child_text(Ns::Itunes, "summary")),
            image: image_href(item),
            duration,
            season: item
                .child_text(Ns::Itunes, "season")
                .and_then(|s| s.parse().ok()),
            episode: item
                .child_text(Ns::Itunes, "episode")
                .and_then(|s| s.parse().ok()),
            explicit: item
                .child_text(Ns::Itunes, "explicit")
                .is_some_and(parse_explicit),
            keywords: item
                .child_text(Ns::Itunes, "keywords")
                .map(parse_keywords)
                .unwrap_or_default(),
        }
    }
}

fn image_href(parent: &XmlElement) -> Option<String> {
    parent
        .child(Ns::Itunes, "image")
        .and_then(|image| image.attr("href"))
        .map(str::to_string)
}

/// Converts `SS`, `MM:SS` or `HH:MM:SS` into whole seconds.
///
/// The leading component may exceed 59 (`"75:00"` is 75 minutes); trailing
/// components must be below 60. Fractional seconds are truncated.
///
/// ```
/// use podfeed::feed::parse_duration;
///
/// assert_eq!(parse_duration("01:15:30"), Some(4530));
/// assert_eq!(parse_duration("50:00"), Some(3000));
/// assert_eq!(parse_duration("42"), Some(42));
/// assert_eq!(parse_duration(""), None);
/// ```
pub fn parse_duration(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let seconds = parse_seconds(last)?;
    if !leading.is_empty() && seconds >= 60 {
        return None;
    }

    let mut total = seconds;
    let mut multiplier = 60;
    for (i, part) in leading.iter().rev().enumerate() {
        let value: u64 = part.trim().parse().ok()?;
        // Only the leading component may overflow its unit
        if i + 1 < leading.len() && value >= 60 {
            return None;
        }
        total = total.checked_add(value.checked_mul(multiplier)?)?;
        multiplier *= 60;
    }

    Some(total)
}

fn parse_seconds(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let whole = match raw.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c.is_ascii_digit()) => whole,
        Some(_) => return None,
        None => raw,
    };
    if whole.is_empty() {
        return None;
    }
    whole.parse().ok()
}

/// Splits a comma-delimited keyword list, trimming entries and dropping empties.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// `itunes:explicit` accepts `yes`/`true`/`explicit`; anything else is clean.
pub fn parse_explicit(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "explicit"
    )
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_string)
}
