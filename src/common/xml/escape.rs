use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters.
///
/// Safe for both text content and double-quoted attribute values.
///
/// # Examples
///
/// ```
/// use seafform::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Whether `ch` may appear in an XML 1.0 document.
#[inline]
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Make text storable as XML character data.
///
/// Line breaks become `\n` and characters XML 1.0 forbids (most C0
/// controls, `U+FFFE`, `U+FFFF`) are dropped.
///
/// # Examples
///
/// ```
/// use seafform::common::xml::xml_text;
/// assert_eq!(xml_text("a\u{1}b\r\nc\rd"), "ab\nc\nd");
/// assert_eq!(xml_text("plain"), "plain");
/// ```
pub fn xml_text(s: &str) -> Cow<'_, str> {
    if s.chars().all(|ch| ch != '\r' && is_xml_char(ch)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push('\n');
            },
            ch if is_xml_char(ch) => out.push(ch),
            _ => {},
        }
    }
    Cow::Owned(out)
}

/// Resolve the body of an entity or character reference (the part between
/// `&` and `;`).
///
/// Only the five predefined entities and numeric character references exist
/// in ODF documents; anything else yields `None`.
pub fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        },
    }
}

/// Unescape XML entities and character references.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use seafform::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("caf&#233;"), "café");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("a & b"), "a & b");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|end| Some((end, resolve_reference(&tail[1..end])?))) {
            Some((end, ch)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let raw = "Tom & \"Jerry\" <3 'cheese'";
        assert_eq!(unescape_xml(&escape_xml(raw)), raw);
    }

    #[test]
    fn test_xml_text_drops_forbidden_characters() {
        assert_eq!(xml_text("a\u{0}b\u{b}c\u{1f}d\u{fffe}"), "abcd");
        assert_eq!(xml_text("tab\tok\nline"), "tab\tok\nline");
        assert!(matches!(xml_text("caf\u{e9} \u{1f600}"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_xml_text_normalizes_line_breaks() {
        assert_eq!(xml_text("one\r\ntwo\rthree\n\r\nfour"), "one\ntwo\nthree\n\nfour");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(resolve_reference("#x41"), Some('A'));
        assert_eq!(resolve_reference("#65"), Some('A'));
        assert_eq!(resolve_reference("#xZZ"), None);
        assert_eq!(resolve_reference("nbsp"), None);
    }

    #[test]
    fn test_unterminated_reference() {
        assert_eq!(unescape_xml("fish &amp chips"), "fish &amp chips");
    }
}
