use html_escape::decode_html_entities;
use std::borrow::Cow;

/// SEC-016: Strip control characters and ANSI escape sequences from feed text.
///
/// Feed XML is attacker-controlled; titles and names end up in terminals and
/// logs. Tab, newline and carriage return are kept.
///
/// Returns `Cow::Borrowed` when nothing needs stripping (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_stripped(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            // CSI: parameters until a final byte in 0x40..=0x7E
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: until BEL or ST (ESC \)
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

fn is_stripped(c: char) -> bool {
    (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\x7f'
}

/// Converts an HTML fragment into plain text lines.
///
/// Block-level boundaries (`<br>`, `</p>`, `</li>`, `</div>`, headings) become
/// line breaks, every other tag is dropped, and HTML character references
/// are decoded. Lines are trimmed and empty lines removed.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            // Unterminated "<": keep it as literal text
            text.push_str(after);
            rest = "";
            break;
        };

        let tag = after[1..close].trim().to_ascii_lowercase();
        if is_line_break_tag(&tag) {
            text.push('\n');
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);

    decode_html_entities(&text)
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn is_line_break_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");

    match name {
        "br" | "hr" => true,
        "p" | "li" | "div" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            tag.starts_with('/')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let result = strip_control_chars("Episode 12: Hello");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_preserves_tabs_newlines_cr() {
        assert_eq!(strip_control_chars("a\tb\nc\rd"), "a\tb\nc\rd");
    }

    #[test]
    fn test_strip_control_chars_removes_controls() {
        assert_eq!(strip_control_chars("a\x00b\x07c\x7fd"), "abcd");
    }

    #[test]
    fn test_strip_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_control_chars("\x1b]8;;x\x1b\\link"), "link");
        assert_eq!(strip_control_chars("a\x1bb"), "ab");
    }

    #[test]
    fn test_strip_unicode_preserved() {
        assert_eq!(strip_control_chars("Café \u{1F399}\x01"), "Café \u{1F399}");
    }

    #[test]
    fn test_html_to_lines_breaks_on_blocks() {
        let html = "<p>00:00 Intro</p><p>05:30 Main topic<br/>12:00 Outro</p>";
        assert_eq!(
            html_to_lines(html),
            vec!["00:00 Intro", "05:30 Main topic", "12:00 Outro"]
        );
    }

    #[test]
    fn test_html_to_lines_list_items_and_inline_tags() {
        let html = "<ul><li><b>01:00</b> First</li><li>02:00 <a href=\"x\">Second</a></li></ul>";
        assert_eq!(html_to_lines(html), vec!["01:00 First", "02:00 Second"]);
    }

    #[test]
    fn test_html_to_lines_decodes_entities() {
        let html = "Q&amp;A &lt;live&gt; &#8212; caf&#xE9; &unknown; AT&T";
        assert_eq!(html_to_lines(html), vec!["Q&A <live> \u{2014} café &unknown; AT&T"]);
    }

    #[test]
    fn test_html_to_lines_decodes_typographic_entities() {
        let html = "<p>05:30 Tom&rsquo;s &ldquo;big&rdquo; caf&eacute; chat</p>";
        assert_eq!(
            html_to_lines(html),
            vec!["05:30 Tom\u{2019}s \u{201C}big\u{201D} caf\u{e9} chat"]
        );
    }

    #[test]
    fn test_html_to_lines_plain_text_keeps_newlines() {
        let text = "line one\n\n  line two  \n";
        assert_eq!(html_to_lines(text), vec!["line one", "line two"]);
    }

    #[test]
    fn test_html_to_lines_unterminated_tag() {
        assert_eq!(html_to_lines("a < b"), vec!["a < b"]);
    }
}
