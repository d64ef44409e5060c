//! Structural checks over an already-built [`Feed`]. Pure; no I/O.

use crate::model::{Episode, Feed, ValidationResult};
use crate::util::{is_internal_host, validate_url};

/// Validates a feed, reporting problems as data.
///
/// Errors (the feed is unusable): missing feed title or description, and any
/// episode missing a title, guid or enclosure URL.
///
/// Warnings (the feed is usable): malformed or internal links, missing cover
/// image or language, episodes without a publish date or duration.
pub fn validate_feed(feed: &Feed) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if is_blank(&feed.title) {
        errors.push("Feed is missing a title".to_string());
    }
    if is_blank(&feed.description) {
        errors.push("Feed is missing a description".to_string());
    }

    match feed.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        None => warnings.push("Feed has no website link".to_string()),
        Some(link) => check_url("Feed link", link, &mut warnings),
    }
    match feed.image.as_deref() {
        None => warnings.push("Feed has no cover image".to_string()),
        Some(image) => check_url("Feed image", image, &mut warnings),
    }
    if is_blank(&feed.language) {
        warnings.push("Feed has no language".to_string());
    }
    if feed.episodes.is_empty() {
        warnings.push("Feed has no episodes".to_string());
    }

    for (index, episode) in feed.episodes.iter().enumerate() {
        validate_episode(index, episode, &mut errors, &mut warnings);
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn validate_episode(
    index: usize,
    episode: &Episode,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let label = episode_label(index, episode);

    if is_blank(&episode.title) {
        errors.push(format!("{label} is missing a title"));
    }
    if is_blank(&episode.guid) {
        errors.push(format!("{label} is missing a guid"));
    }
    match episode.audio_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        None => errors.push(format!("{label} is missing an audio enclosure URL")),
        Some(url) => check_url(&format!("{label} enclosure"), url, warnings),
    }

    if episode.pub_date.is_none() {
        warnings.push(format!("{label} has no publish date"));
    }
    if episode.duration.is_none() {
        warnings.push(format!("{label} has no duration"));
    }
}

fn episode_label(index: usize, episode: &Episode) -> String {
    match episode.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("Episode {} (\"{}\")", index + 1, title),
        None => format!("Episode {}", index + 1),
    }
}

fn check_url(what: &str, raw: &str, warnings: &mut Vec<String>) {
    match validate_url(raw) {
        Ok(url) if is_internal_host(&url) => {
            warnings.push(format!("{what} points to an internal host: {raw}"));
        }
        Ok(_) => {}
        Err(e) => warnings.push(format!("{what} is not a well-formed URL ({e}): {raw}")),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn good_episode(n: u32) -> Episode {
        Episode {
            title: Some(format!("Episode {n}")),
            guid: Some(format!("guid-{n}")),
            audio_url: Some(format!("https://cdn.example.com/{n}.mp3")),
            pub_date: Some(Utc::now()),
            duration: Some(1800),
            ..Default::default()
        }
    }

    fn good_feed() -> Feed {
        Feed {
            title: Some("Show".into()),
            description: Some("About the show".into()),
            url: "https://example.com/feed.xml".into(),
            link: Some("https://example.com".into()),
            image: Some("https://example.com/cover.jpg".into()),
            language: Some("en".into()),
            episodes: vec![good_episode(1), good_episode(2)],
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_feed_is_clean() {
        let result = validate_feed(&good_feed());
        assert!(result.is_valid);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_missing_title_and_description_are_errors() {
        let mut feed = good_feed();
        feed.title = None;
        feed.description = Some("   ".into());

        let result = validate_feed(&feed);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("title"));
        assert!(result.errors[1].contains("description"));
    }

    #[test]
    fn test_episode_errors() {
        let mut feed = good_feed();
        feed.episodes[0].guid = None;
        feed.episodes[1].title = None;
        feed.episodes[1].audio_url = None;

        let result = validate_feed(&feed);
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                "Episode 1 (\"Episode 1\") is missing a guid",
                "Episode 2 is missing a title",
                "Episode 2 is missing an audio enclosure URL",
            ]
        );
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let mut feed = good_feed();
        feed.link = Some("not a url".into());
        feed.image = None;
        feed.language = None;
        feed.episodes[0].pub_date = None;
        feed.episodes[1].duration = None;

        let result = validate_feed(&feed);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 5);
        assert!(result.warnings[0].starts_with("Feed link is not a well-formed URL"));
        assert!(result.warnings[3].contains("publish date"));
        assert!(result.warnings[4].contains("duration"));
    }

    #[test]
    fn test_internal_enclosure_is_suspicious() {
        let mut feed = good_feed();
        feed.episodes[0].audio_url = Some("http://192.168.0.10/ep.mp3".into());

        let result = validate_feed(&feed);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("internal host"));
    }

    #[test]
    fn test_missing_description_gives_error_and_warning() {
        let feed = Feed {
            title: Some("Bare".into()),
            url: "https://example.com/feed.xml".into(),
            episodes: vec![Episode {
                title: Some("Only".into()),
                guid: Some("1".into()),
                audio_url: Some("https://example.com/1.mp3".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let result = validate_feed(&feed);
        assert!(!result.is_valid);
        assert!(!result.errors.is_empty());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_empty_feed_warns() {
        let mut feed = good_feed();
        feed.episodes.clear();
        let result = validate_feed(&feed);
        assert!(result.is_valid);
        assert_eq!(result.warnings, vec!["Feed has no episodes"]);
    }
}
