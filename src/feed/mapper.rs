//! Maps an RSS document onto the [`Feed`]/[`Episode`] model.
//!
//! Parsing happens in three steps: [`xml::parse_document`] checks
//! well-formedness, the channel/item elements are lifted into one DTO per
//! namespace (RSS core, iTunes, Podcast 2.0), and the DTOs are merged here
//! with per-field fallbacks. Chapters are left unresolved; the chapter
//! resolver fills them in afterwards from `chapters_url`/`description`.

use crate::model::{Episode, Feed};
use crate::util::strip_control_chars;

use super::error::FeedError;
use super::itunes::{ItunesChannel, ItunesItem};
use super::podcast::{PodcastChannel, PodcastItem};
use super::rss::{RssChannel, RssItem};
use super::xml::{self, Ns, XmlElement};

/// Parses a feed body into a [`Feed`] whose `url` is `source_url`.
///
/// # Errors
///
/// - [`FeedError::XmlParse`] when the body is not well-formed XML
/// - [`FeedError::FeedParse`] when the root is not `<rss>` or it has no `<channel>`
pub fn parse(body: &[u8], source_url: &str) -> Result<Feed, FeedError> {
    let root = xml::parse_document(body)?;

    if !root.is(Ns::None, "rss") {
        return Err(FeedError::FeedParse(format!(
            "root element is <{}>, expected <rss>",
            root.name
        )));
    }

    let channel = root
        .child(Ns::None, "channel")
        .ok_or_else(|| FeedError::FeedParse("missing <channel> element".to_string()))?;

    let feed = map_channel(channel, source_url);
    tracing::debug!(
        url = %source_url,
        episodes = feed.episodes.len(),
        "Mapped feed document"
    );
    Ok(feed)
}

fn map_channel(channel: &XmlElement, source_url: &str) -> Feed {
    let rss = RssChannel::from_element(channel);
    let itunes = ItunesChannel::from_element(channel);
    let podcast = PodcastChannel::from_element(channel);

    let episodes = channel
        .children_named(Ns::None, "item")
        .map(map_item)
        .collect();

    Feed {
        title: clean(rss.title),
        description: rss.description,
        summary: itunes.summary,
        url: source_url.to_string(),
        link: rss.link,
        image: itunes.image.or(rss.image_url),
        author: clean(itunes.author.or(rss.managing_editor)),
        category: itunes
            .categories
            .into_iter()
            .next()
            .or_else(|| rss.categories.into_iter().next()),
        language: rss.language,
        copyright: rss.copyright,
        explicit: itunes.explicit,
        last_build_date: rss.last_build_date,
        funding: podcast.funding,
        persons: podcast.persons,
        episodes,
    }
}

fn map_item(item: &XmlElement) -> Episode {
    let rss = RssItem::from_element(item);
    let itunes = ItunesItem::from_element(item);
    let podcast = PodcastItem::from_element(item);

    let transcript = podcast.subtitle_transcript().map(|t| t.url.clone());
    let (audio_url, audio_type, audio_length) = match rss.enclosure {
        Some(e) => (Some(e.url), e.mime_type, e.length),
        None => (None, None, None),
    };

    Episode {
        title: clean(rss.title.or(itunes.title)),
        guid: rss.guid,
        description: rss
            .description
            .or(rss.content_encoded)
            .or(itunes.summary),
        link: rss.link,
        image: itunes.image,
        audio_url,
        audio_type,
        audio_length,
        pub_date: rss.pub_date,
        duration: itunes.duration,
        season_number: itunes.season.or(podcast.season),
        episode_number: itunes.episode.or(podcast.episode),
        keywords: itunes.keywords,
        explicit: itunes.explicit,
        transcript,
        funding: podcast.funding,
        persons: podcast.persons,
        chapters_url: podcast.chapters_url,
        chapters: None,
    }
}

/// SEC-016: titles and names are displayed verbatim downstream.
fn clean(s: Option<String>) -> Option<String> {
    s.map(|s| strip_control_chars(&s).into_owned())
}
