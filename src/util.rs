//! Utility functions with platform-specific implementations.

use std::borrow::Cow;

/// Seconds since the Unix epoch, used to stamp book and page updates.
///
/// The browser build reads the clock through `Date.now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_secs() -> u64 {
    let millis = js_sys::Date::now();
    (millis / 1000.0) as u64
}

/// Decode the text part of an uploaded document.
///
/// Valid UTF-8 (with or without a BOM) is returned as is. Otherwise the
/// `hint_encoding` label is used when `encoding_rs` knows it, and
/// Windows-1252 when it does not.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Truncate a string to at most `max_bytes` bytes without splitting a character.
///
/// ```ignore
/// assert_eq!(truncate_utf8("héllo", 2), "h");
/// ```
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Remove every closed `<...>` tag, keeping the text around it.
///
/// A `<` with no `>` after it is plain text and stays in the output.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|i| open + i) else {
            break;
        };
        // The tag opens at the last `<` before its `>`
        let open = rest[..close].rfind('<').unwrap_or(open);
        out.push_str(&rest[..open]);
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape HTML special characters for text content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8_and_fallback() {
        assert_eq!(decode_text("سلام".as_bytes(), None), "سلام");
        // 0xE9 is 'é' in Windows-1252 and invalid as standalone UTF-8
        assert_eq!(decode_text(&[b'c', b'a', b'f', 0xE9], None), "café");
    }

    #[test]
    fn test_truncate_utf8_respects_boundaries() {
        assert_eq!(truncate_utf8("hello", 10), "hello");
        assert_eq!(truncate_utf8("hello", 3), "hel");
        // 'é' is two bytes
        assert_eq!(truncate_utf8("héllo", 2), "h");
        // Arabic letters are two bytes each
        assert_eq!(truncate_utf8("سلام", 5), "سل");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("a > b"), "a > b");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_strip_tags_keeps_unclosed_angle() {
        assert_eq!(strip_tags("5 < 6 is true"), "5 < 6 is true");
        assert_eq!(strip_tags("a < b <i>c</i>"), "a < b c");
        assert_eq!(strip_tags("<b>x</b> <"), "x <");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
