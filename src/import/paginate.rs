//! Splitting a stream of text lines into fixed-size pages.

use crate::book::ParsedPage;
use crate::util::{collapse_whitespace, escape_html, strip_tags};

use super::ParseOptions;

/// Content given to a page whose text is blank.
pub const EMPTY_PAGE: &str = "(Empty page)";

/// Title given to a page with no text to derive one from.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Accumulates lines and cuts them into pages.
///
/// A page is emitted whenever the buffer reaches `chars_per_page` characters
/// (the buffer is cut at exactly that many characters and the rest carries
/// over) or when a line arrives carrying an explicit page break. Whatever is
/// left at the end becomes the last page, unless it is blank.
#[derive(Debug)]
pub struct Paginator {
    chars_per_page: usize,
    title_max_chars: usize,
    buffer: String,
    /// Number of chars in `buffer`, tracked to avoid recounting.
    buffer_chars: usize,
    pages: Vec<ParsedPage>,
}

impl Paginator {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            chars_per_page: options.chars_per_page.max(1),
            title_max_chars: options.title_max_chars,
            buffer: String::new(),
            buffer_chars: 0,
            pages: Vec::new(),
        }
    }

    /// Append one line (a newline is added) and flush as needed.
    ///
    /// `page_break` means the line ends the current page.
    pub fn push_line(&mut self, line: &str, page_break: bool) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.buffer_chars += line.chars().count() + 1;

        let mut cut = false;
        while self.buffer_chars >= self.chars_per_page {
            self.flush_threshold();
            cut = true;
        }

        // A cut that emptied the buffer already ended the page
        if page_break && !(cut && self.buffer_chars == 0) {
            let text = std::mem::take(&mut self.buffer);
            self.buffer_chars = 0;
            self.emit(&text);
        }
    }

    /// Number of pages emitted so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Flush any remaining non-blank text and return the pages.
    pub fn finish(mut self) -> Vec<ParsedPage> {
        if !self.buffer.trim().is_empty() {
            let text = std::mem::take(&mut self.buffer);
            self.emit(&text);
        }
        self.pages
    }

    fn flush_threshold(&mut self) {
        let cut = self
            .buffer
            .char_indices()
            .nth(self.chars_per_page)
            .map(|(idx, _)| idx)
            .unwrap_or(self.buffer.len());
        let rest = self.buffer.split_off(cut);
        let chunk = std::mem::replace(&mut self.buffer, rest);
        self.buffer_chars -= self.chars_per_page;
        self.emit(&chunk);
    }

    fn emit(&mut self, raw: &str) {
        let trimmed = raw.trim();
        let content = if trimmed.is_empty() {
            EMPTY_PAGE.to_string()
        } else {
            escape_html(trimmed)
        };
        let title = derive_title(trimmed, self.title_max_chars);

        self.pages.push(ParsedPage {
            page_number: self.pages.len() as u32 + 1,
            content,
            title,
        });
    }
}

/// Derive a page title from its text.
///
/// Takes the first line that still has text once markup is stripped and
/// whitespace collapsed. Lines longer than `max_chars` characters are cut and
/// get `"..."` appended.
///
/// ```
/// use folio::import::derive_title;
///
/// assert_eq!(derive_title("\n  Chapter   One \nBody", 100), "Chapter One");
/// assert_eq!(derive_title("", 100), "Untitled Section");
/// ```
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let first_line = text
        .lines()
        .map(|line| collapse_whitespace(&strip_tags(line)))
        .find(|line| !line.is_empty());

    match first_line {
        Some(line) if line.chars().count() > max_chars => {
            let cut: String = line.chars().take(max_chars).collect();
            format!("{cut}...")
        }
        Some(line) => line,
        None => UNTITLED_SECTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn options(chars_per_page: usize) -> ParseOptions {
        ParseOptions {
            chars_per_page,
            ..ParseOptions::default()
        }
    }

    #[test]
    fn test_threshold_splits_long_line() {
        let mut paginator = Paginator::new(&options(10));
        paginator.push_line(&"x".repeat(25), false);
        let pages = paginator.finish();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].content.len(), 10);
        assert_eq!(pages[1].content.len(), 10);
        assert_eq!(pages[2].content, "xxxxx");
        let numbers: Vec<_> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_explicit_break_flushes() {
        let mut paginator = Paginator::new(&ParseOptions::default());
        paginator.push_line("First page", true);
        paginator.push_line("Second page", false);
        let pages = paginator.finish();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content, "First page");
        assert_eq!(pages[0].title, "First page");
        assert_eq!(pages[1].content, "Second page");
    }

    #[test]
    fn test_break_at_exact_threshold_flushes_once() {
        let mut paginator = Paginator::new(&options(10));
        paginator.push_line("123456789", true);
        paginator.push_line("next", false);
        let pages = paginator.finish();

        let contents: Vec<_> = pages.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["123456789", "next"]);
    }

    #[test]
    fn test_break_after_cut_flushes_remainder() {
        let mut paginator = Paginator::new(&options(10));
        paginator.push_line("abcdefghijklm", true);
        paginator.push_line("next", false);
        let pages = paginator.finish();

        let contents: Vec<_> = pages.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["abcdefghij", "klm", "next"]);
    }

    #[test]
    fn test_break_on_blank_buffer_still_makes_a_page() {
        let mut paginator = Paginator::new(&ParseOptions::default());
        paginator.push_line("   ", true);
        paginator.push_line("Text", false);
        let pages = paginator.finish();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content, EMPTY_PAGE);
        assert_eq!(pages[0].title, UNTITLED_SECTION);
    }

    #[test]
    fn test_blank_threshold_chunk_gets_placeholder() {
        let mut paginator = Paginator::new(&options(4));
        paginator.push_line("   ", false);
        let pages = paginator.finish();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content, EMPTY_PAGE);
    }

    #[test]
    fn test_blank_tail_is_dropped() {
        let mut paginator = Paginator::new(&ParseOptions::default());
        paginator.push_line("Body", true);
        paginator.push_line("", false);
        paginator.push_line("  ", false);
        assert_eq!(paginator.finish().len(), 1);
    }

    #[test]
    fn test_content_is_escaped_title_is_not() {
        let mut paginator = Paginator::new(&ParseOptions::default());
        paginator.push_line("Tom & Jerry", false);
        let pages = paginator.finish();
        assert_eq!(pages[0].content, "Tom &amp; Jerry");
        assert_eq!(pages[0].title, "Tom & Jerry");
    }

    #[test]
    fn test_derive_title_truncates_by_chars() {
        let line = "ک".repeat(150);
        let title = derive_title(&line, 100);
        assert_eq!(title.chars().count(), 103);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_derive_title_keeps_literal_angle() {
        assert_eq!(derive_title("5 < 6 is true", 100), "5 < 6 is true");
        assert_eq!(derive_title("a < b <i>c</i>\nbody", 100), "a < b c");
    }

    #[test]
    fn test_derive_title_skips_markup_only_lines() {
        assert_eq!(derive_title("<br/>\n<b>Real</b> title", 100), "Real title");
    }

    proptest! {
        #[test]
        fn prop_pages_never_exceed_limit(
            lines in prop::collection::vec("[a-z ]{0,40}", 1..60),
            limit in 20usize..200,
        ) {
            let mut paginator = Paginator::new(&options(limit));
            for line in &lines {
                paginator.push_line(line, false);
            }
            let pages = paginator.finish();
            for (idx, page) in pages.iter().enumerate() {
                prop_assert!(page.content.chars().count() <= limit);
                prop_assert_eq!(page.page_number as usize, idx + 1);
            }
        }
    }
}
