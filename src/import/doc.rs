//! Legacy `.doc` text extraction.
//!
//! No structural parsing: old Word files saved as web archives carry a MIME
//! part declared as `Content-Type: text/plain`. Everything after that header
//! line is taken as the document text.

use crate::error::ParseError;
use crate::util::decode_text;

const PLAIN_TEXT_MARKER: &[u8] = b"content-type: text/plain";

/// Extract the plain-text section from a legacy document.
pub(crate) fn extract_plain_text(bytes: &[u8]) -> Result<String, ParseError> {
    let marker = bytes
        .windows(PLAIN_TEXT_MARKER.len())
        .position(|w| w.eq_ignore_ascii_case(PLAIN_TEXT_MARKER))
        .ok_or_else(|| {
            ParseError::MalformedDocument("no plain-text section found in .doc file".into())
        })?;

    // The text starts on the line after the marker
    let after = marker + PLAIN_TEXT_MARKER.len();
    let start = memchr::memchr(b'\n', &bytes[after..])
        .map(|i| after + i + 1)
        .unwrap_or(bytes.len());

    Ok(decode_text(&bytes[start..], None).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_after_marker_line() {
        let data = b"\xD0\xCF\x11\xE0junk\r\nContent-Type: text/plain; charset=utf-8\r\nFirst line\r\nSecond line\r\n";
        let text = extract_plain_text(data).unwrap();
        assert_eq!(text, "First line\r\nSecond line\r\n");
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let data = b"CONTENT-TYPE: TEXT/PLAIN\nbody";
        assert_eq!(extract_plain_text(data).unwrap(), "body");
    }

    #[test]
    fn test_missing_marker() {
        assert!(matches!(
            extract_plain_text(b"binary garbage"),
            Err(ParseError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let data = b"Content-Type: text/plain\ncaf\xE9";
        assert_eq!(extract_plain_text(data).unwrap(), "café");
    }
}
