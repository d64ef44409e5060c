//! Core RSS 2.0 elements (plus `content:encoded`) lifted out of the XML tree.

use chrono::{DateTime, Utc};

use super::xml::{Ns, XmlElement};

#[derive(Debug, Default)]
pub(crate) struct RssChannel {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub managing_editor: Option<String>,
    pub last_build_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub content_encoded: Option<String>,
    pub guid: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub enclosure: Option<Enclosure>,
}

#[derive(Debug)]
pub(crate) struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
    pub length: Option<u64>,
}

impl RssChannel {
    pub fn from_element(channel: &XmlElement) -> Self {
        let last_build_date = channel
            .child_text(Ns::None, "lastBuildDate")
            .or_else(|| channel.child_text(Ns::None, "pubDate"))
            .and_then(parse_date);

        Self {
            title: owned(channel.child_text(Ns::None, "title")),
            link: owned(channel.child_text(Ns::None, "link")),
            description: owned(channel.child_text(Ns::None, "description")),
            language: owned(channel.child_text(Ns::None, "language")),
            copyright: owned(channel.child_text(Ns::None, "copyright")),
            managing_editor: owned(channel.child_text(Ns::None, "managingEditor")),
            last_build_date,
            image_url: owned(
                channel
                    .child(Ns::None, "image")
                    .and_then(|image| image.child_text(Ns::None, "url")),
            ),
            categories: channel
                .children_named(Ns::None, "category")
                .filter_map(XmlElement::text)
                .map(str::to_string)
                .collect(),
        }
    }
}

impl RssItem {
    pub fn from_element(item: &XmlElement) -> Self {
        let pub_date = item.child_text(Ns::None, "pubDate").and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                tracing::debug!(value = %raw, "Ignoring unparseable pubDate");
            }
            parsed
        });

        Self {
            title: owned(item.child_text(Ns::None, "title")),
            link: owned(item.child_text(Ns::None, "link")),
            description: owned(item.child_text(Ns::None, "description")),
            content_encoded: owned(item.child_text(Ns::Content, "encoded")),
            guid: owned(item.child_text(Ns::None, "guid")),
            pub_date,
            enclosure: item.child(Ns::None, "enclosure").and_then(Enclosure::from_element),
        }
    }
}

impl Enclosure {
    /// An enclosure without a `url` attribute carries nothing usable.
    fn from_element(element: &XmlElement) -> Option<Self> {
        let Some(url) = element.attr("url") else {
            tracing::debug!("Skipping <enclosure> without url attribute");
            return None;
        };

        Some(Self {
            url: url.to_string(),
            mime_type: element.attr("type").map(str::to_string),
            length: element.attr("length").and_then(|l| l.parse().ok()),
        })
    }
}

/// Parses RSS dates (RFC 2822), falling back to RFC 3339 which some
/// generators emit instead.
pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::xml::parse_document;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Tue, 02 Jan 2024 10:30:00 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap());

        let dt = parse_date("Tue, 02 Jan 2024 10:30:00 +0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 2, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_rfc3339_fallback() {
        let dt = parse_date("2024-01-02T10:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_garbage() {
        assert!(parse_date("last tuesday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_item_fields() {
        let doc = br#"<item xmlns:content="http://purl.org/rss/1.0/modules/content/">
<title> Ep 1 </title><guid isPermaLink="false">abc-1</guid>
<pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
<description>short</description><content:encoded><![CDATA[<p>long</p>]]></content:encoded>
<enclosure url="https://cdn.example.com/1.mp3" length="1234" type="audio/mpeg"/>
</item>"#;
        let item = RssItem::from_element(&parse_document(doc).unwrap());
        assert_eq!(item.title.as_deref(), Some("Ep 1"));
        assert_eq!(item.guid.as_deref(), Some("abc-1"));
        assert!(item.pub_date.is_some());
        assert_eq!(item.content_encoded.as_deref(), Some("<p>long</p>"));

        let enclosure = item.enclosure.unwrap();
        assert_eq!(enclosure.url, "https://cdn.example.com/1.mp3");
        assert_eq!(enclosure.length, Some(1234));
        assert_eq!(enclosure.mime_type.as_deref(), Some("audio/mpeg"));
    }

    #[test]
    fn test_enclosure_without_url_dropped() {
        let item = RssItem::from_element(
            &parse_document(br#"<item><enclosure type="audio/mpeg"/></item>"#).unwrap(),
        );
        assert!(item.enclosure.is_none());
    }

    #[test]
    fn test_channel_image_and_categories() {
        let doc = br#"<channel><title>T</title>
<image><url>https://example.com/cover.jpg</url></image>
<category>Tech</category><category>News</category></channel>"#;
        let channel = RssChannel::from_element(&parse_document(doc).unwrap());
        assert_eq!(channel.image_url.as_deref(), Some("https://example.com/cover.jpg"));
        assert_eq!(channel.categories, vec!["Tech", "News"]);
        assert!(channel.description.is_none());
    }
}
