//! Well-formedness layer: turns raw bytes into an owned element tree.
//!
//! Everything that is wrong at the XML level (bad syntax, mismatched or
//! unclosed tags, undefined entities, excessive nesting) is reported here as
//! [`FeedError::XmlParse`]. Feed semantics are the mapper's business.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::error::FeedError;

/// SEC-003: Maximum element nesting depth. RSS rarely exceeds 6.
const MAX_XML_DEPTH: usize = 64;

const ITUNES_NS: &[u8] = b"http://www.itunes.com/dtds/podcast-1.0.dtd";
const PODCAST_NS: &[u8] = b"https://podcastindex.org/namespace/1.0";
const PODCAST_NS_LEGACY: &[u8] =
    b"https://github.com/Podcastindex-org/podcast-namespace/blob/main/docs/1.0.md";
const CONTENT_NS: &[u8] = b"http://purl.org/rss/1.0/modules/content/";

/// Namespaces the mapper understands, resolved by URI rather than prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ns {
    /// No namespace (plain RSS 2.0 elements)
    None,
    Itunes,
    Podcast,
    Content,
    /// Declared but unrecognised namespace, or an undeclared prefix
    Other,
}

impl Ns {
    fn from_resolved(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Unbound => Ns::None,
            ResolveResult::Bound(Namespace(uri)) => match *uri {
                ITUNES_NS => Ns::Itunes,
                PODCAST_NS | PODCAST_NS_LEGACY => Ns::Podcast,
                CONTENT_NS => Ns::Content,
                _ => Ns::Other,
            },
            ResolveResult::Unknown(_) => Ns::Other,
        }
    }
}

/// An element with its attributes, concatenated text content and children.
#[derive(Debug, Clone)]
pub(crate) struct XmlElement {
    pub ns: Ns,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn is(&self, ns: Ns, name: &str) -> bool {
        self.ns == ns && self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn child(&self, ns: Ns, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(ns, name))
    }

    pub fn children_named<'a>(
        &'a self,
        ns: Ns,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(ns, name))
    }

    /// Trimmed text of this element, or `None` when blank.
    pub fn text(&self) -> Option<&str> {
        let t = self.text.trim();
        (!t.is_empty()).then_some(t)
    }

    /// Trimmed text of the first matching child, or `None` when absent or blank.
    pub fn child_text(&self, ns: Ns, name: &str) -> Option<&str> {
        self.child(ns, name).and_then(XmlElement::text)
    }
}

/// Parses a complete document and returns its root element.
///
/// # Errors
///
/// [`FeedError::XmlParse`] for any well-formedness violation, including a
/// missing root element, more than one root, non-whitespace text outside the
/// root, and elements still open at end of input.
pub(crate) fn parse_document(bytes: &[u8]) -> Result<XmlElement, FeedError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations from a
    // DOCTYPE; undefined entities surface as errors from `unescape()`.
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (ns, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, event)) => (Ns::from_resolved(&ns), event),
            Err(e) => return Err(xml_error(&reader, e.to_string())),
        };

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(xml_error(
                        &reader,
                        format!("nesting depth exceeds maximum of {MAX_XML_DEPTH} levels"),
                    ));
                }
                let element = open_element(ns, &e, &reader)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = open_element(ns, &e, &reader)?;
                attach(&mut stack, &mut root, element, &reader)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(xml_error(&reader, "unmatched closing tag".to_string()));
                };
                attach(&mut stack, &mut root, element, &reader)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| xml_error(&reader, err.to_string()))?;
                push_text(&mut stack, &text, &reader)?;
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw), &reader)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, DOCTYPE
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(
            &reader,
            format!("unexpected end of document: <{}> is not closed", open.name),
        ));
    }

    root.ok_or_else(|| xml_error(&reader, "document has no root element".to_string()))
}

fn open_element(
    ns: Ns,
    start: &BytesStart<'_>,
    reader: &NsReader<&[u8]>,
) -> Result<XmlElement, FeedError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let decoder = reader.decoder();

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| xml_error(reader, e.to_string()))?;
        attrs.push((key, value.into_owned()));
    }

    Ok(XmlElement {
        ns,
        name,
        attrs,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    reader: &NsReader<&[u8]>,
) -> Result<(), FeedError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(xml_error(
            reader,
            format!("second root element <{}>", element.name),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(
    stack: &mut [XmlElement],
    text: &str,
    reader: &NsReader<&[u8]>,
) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(xml_error(reader, "text outside of root element".to_string())),
    }
}

fn xml_error(reader: &NsReader<&[u8]>, message: String) -> FeedError {
    FeedError::XmlParse {
        position: reader.error_position() as u64,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_xml_error(result: Result<XmlElement, FeedError>) -> bool {
        matches!(result, Err(FeedError::XmlParse { .. }))
    }

    #[test]
    fn test_builds_tree_with_text_and_attributes() {
        let doc = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Show &amp; Tell</title>
<item><enclosure url="https://example.com/a.mp3" type="audio/mpeg"/></item>
</channel></rss>"#;
        let root = parse_document(doc).unwrap();
        assert!(root.is(Ns::None, "rss"));
        assert_eq!(root.attr("version"), Some("2.0"));

        let channel = root.child(Ns::None, "channel").unwrap();
        assert_eq!(channel.child_text(Ns::None, "title"), Some("Show & Tell"));

        let item = channel.child(Ns::None, "item").unwrap();
        let enclosure = item.child(Ns::None, "enclosure").unwrap();
        assert_eq!(enclosure.attr("url"), Some("https://example.com/a.mp3"));
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse_document(b"<a><b><![CDATA[<p>hi</p>]]></b></a>").unwrap();
        assert_eq!(root.child_text(Ns::None, "b"), Some("<p>hi</p>"));
    }

    #[test]
    fn test_namespaces_resolved_by_uri() {
        let doc = br#"<rss xmlns:it="http://www.itunes.com/dtds/podcast-1.0.dtd"
 xmlns:podcast="https://podcastindex.org/namespace/1.0"
 xmlns:x="urn:other">
<it:duration>10</it:duration><podcast:locked>yes</podcast:locked><x:duration>5</x:duration>
<undeclared:thing>1</undeclared:thing></rss>"#;
        let root = parse_document(doc).unwrap();
        assert_eq!(root.child_text(Ns::Itunes, "duration"), Some("10"));
        assert_eq!(root.child_text(Ns::Podcast, "locked"), Some("yes"));
        assert_eq!(root.child_text(Ns::Other, "duration"), Some("5"));
        assert!(root.child(Ns::None, "thing").is_none());
    }

    #[test]
    fn test_legacy_podcast_namespace_uri() {
        let doc = br#"<rss xmlns:podcast="https://github.com/Podcastindex-org/podcast-namespace/blob/main/docs/1.0.md"><podcast:guid>x</podcast:guid></rss>"#;
        let root = parse_document(doc).unwrap();
        assert_eq!(root.child_text(Ns::Podcast, "guid"), Some("x"));
    }

    #[test]
    fn test_unclosed_tag_is_xml_error() {
        assert!(is_xml_error(parse_document(b"<rss><channel><title>x</title></rss>")));
        assert!(is_xml_error(parse_document(b"<rss><channel>")));
        assert!(is_xml_error(parse_document(b"<not valid xml")));
    }

    #[test]
    fn test_mismatched_nesting_is_xml_error() {
        assert!(is_xml_error(parse_document(b"<a><b></a></b>")));
    }

    #[test]
    fn test_empty_and_text_only_documents_rejected() {
        assert!(is_xml_error(parse_document(b"")));
        assert!(is_xml_error(parse_document(b"   ")));
        assert!(is_xml_error(parse_document(b"just some text")));
    }

    #[test]
    fn test_second_root_rejected() {
        assert!(is_xml_error(parse_document(b"<a/><b/>")));
    }

    #[test]
    fn test_undefined_entity_rejected() {
        assert!(is_xml_error(parse_document(b"<a>&nbsp;</a>")));
    }

    #[test]
    fn test_depth_limit() {
        let mut doc = String::new();
        for _ in 0..(MAX_XML_DEPTH + 1) {
            doc.push_str("<d>");
        }
        for _ in 0..(MAX_XML_DEPTH + 1) {
            doc.push_str("</d>");
        }
        match parse_document(doc.as_bytes()) {
            Err(FeedError::XmlParse { message, .. }) => assert!(message.contains("depth")),
            other => panic!("expected depth error, got {:?}", other),
        }
    }
}
