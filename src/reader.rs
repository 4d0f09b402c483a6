//! Reader navigation and the page view model.
//!
//! The reader addresses pages through the book's canonical URL: page 1 is
//! the bare URL, page N carries `?page=N`, and a `highlight` parameter asks
//! the client to highlight a term once the page has rendered.

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;

use crate::book::{Book, BookId, Language, Page};
use crate::error::{Error, Result};
use crate::util::escape_html;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying a term to highlight.
pub const HIGHLIGHT_PARAM: &str = "highlight";

/// Where the reader should go, as carried by the URL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// 1-based page number; never 0.
    pub page: u32,
    pub highlight: Option<String>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            page: 1,
            highlight: None,
        }
    }
}

impl Navigation {
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            highlight: None,
        }
    }

    /// Parse a query string (with or without the leading `?`).
    ///
    /// A missing, unparseable or non-positive page becomes page 1. A blank
    /// highlight term is dropped.
    ///
    /// ```
    /// use folio::reader::Navigation;
    ///
    /// let nav = Navigation::from_query("?page=4&highlight=%D8%A7%D8%B3%D9%84%D8%A7%D9%85");
    /// assert_eq!(nav.page, 4);
    /// assert_eq!(nav.highlight.as_deref(), Some("اسلام"));
    /// assert_eq!(Navigation::from_query("page=-2").page, 1);
    /// ```
    pub fn from_query(query: &str) -> Self {
        let mut nav = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                PAGE_PARAM => nav.page = parse_page_number(&decode_component(value)),
                HIGHLIGHT_PARAM => {
                    let term = decode_component(value);
                    let term = term.trim();
                    nav.highlight = (!term.is_empty()).then(|| term.to_string());
                }
                _ => {}
            }
        }
        nav
    }

    /// The canonical URL of `page` under `base`.
    ///
    /// ```
    /// use folio::reader::Navigation;
    ///
    /// assert_eq!(Navigation::page_url("/books/7", 1, None), "/books/7");
    /// assert_eq!(Navigation::page_url("/books/7", 3, None), "/books/7?page=3");
    /// assert_eq!(
    ///     Navigation::page_url("/books/7", 3, Some("a b")),
    ///     "/books/7?page=3&highlight=a%20b"
    /// );
    /// ```
    pub fn page_url(base: &str, page: u32, highlight: Option<&str>) -> String {
        let mut params = Vec::new();
        if page > 1 {
            params.push(format!("{PAGE_PARAM}={page}"));
        }
        if let Some(term) = highlight {
            params.push(format!(
                "{HIGHLIGHT_PARAM}={}",
                utf8_percent_encode(term, NON_ALPHANUMERIC)
            ));
        }
        if params.is_empty() {
            return base.to_string();
        }
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}{}", params.join("&"))
    }
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

/// Leading integer of `raw`, clamped to at least 1.
fn parse_page_number(raw: &str) -> u32 {
    let raw = raw.trim();
    let digits_end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(raw.len(), |(i, _)| i);
    raw[..digits_end]
        .parse::<i64>()
        .map_or(1, |n| n.clamp(1, u32::MAX as i64) as u32)
}

/// Text direction of the reader container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rtl,
    Ltr,
}

impl Direction {
    pub fn for_language(language: Language) -> Self {
        if language.is_rtl() {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Rtl => "rtl",
            Direction::Ltr => "ltr",
        }
    }
}

/// Turn stored page content into displayable HTML.
///
/// Content that already looks like markup (it has both `<` and `>`) is used
/// as-is. Anything else is plain text: escaped, with line breaks kept.
/// Entity references already in the text are not escaped a second time.
///
/// ```
/// use folio::reader::render_content;
///
/// assert_eq!(render_content("<p>Hi</p>"), "<p>Hi</p>");
/// assert_eq!(render_content("a < b\nc"), "a &lt; b<br />\nc");
/// assert_eq!(render_content("Fish &amp; Chips & Co"), "Fish &amp; Chips &amp; Co");
/// ```
pub fn render_content(content: &str) -> String {
    if content.contains('<') && content.contains('>') {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(amp) = rest.find('&') {
        out.push_str(&escape_html(&rest[..amp]));
        let tail = &rest[amp..];
        let entity_len = entity_ref_len(tail);
        if entity_len > 0 {
            out.push_str(&tail[..entity_len]);
        } else {
            out.push_str("&amp;");
        }
        rest = &tail[entity_len.max(1)..];
    }
    out.push_str(&escape_html(rest));
    out.replace('\n', "<br />\n")
}

/// Length of the entity reference (`&name;`, `&#NN;`, `&#xHH;`) at the start
/// of `s`, or 0 when there is none.
fn entity_ref_len(s: &str) -> usize {
    let body = &s[1..];
    let Some(end) = body.find(';') else {
        return 0;
    };
    let name = &body[..end];
    let valid = match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => {
            !name.is_empty()
                && name.len() <= 32
                && name.chars().all(|c| c.is_ascii_alphanumeric())
        }
    };
    if valid { end + 2 } else { 0 }
}

/// Everything the reader template needs for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderView {
    pub book_id: BookId,
    pub book_title: String,
    pub author: Option<String>,
    pub language: Language,
    pub direction: Direction,
    pub current_page: u32,
    pub total_pages: usize,
    /// `None` when the requested page does not exist.
    pub page_title: Option<String>,
    pub content_html: Option<String>,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub progress_percent: u32,
    pub highlight: Option<String>,
}

impl ReaderView {
    pub fn new(book: &Book, page: Option<&Page>, total_pages: usize, nav: &Navigation) -> Self {
        let current = nav.page.max(1);
        let total = total_pages as u64;

        let progress_percent = if total == 0 {
            0
        } else {
            (u64::from(current) * 100 / total).min(100) as u32
        };

        Self {
            book_id: book.id,
            book_title: book.title.clone(),
            author: book.author.clone(),
            language: book.language,
            direction: Direction::for_language(book.language),
            current_page: current,
            total_pages,
            page_title: page.map(|p| p.title.clone()).filter(|t| !t.is_empty()),
            content_html: page.map(|p| render_content(&p.content)),
            prev_page: (current > 1).then(|| current - 1),
            next_page: (u64::from(current) < total).then(|| current + 1),
            progress_percent,
            highlight: nav.highlight.clone(),
        }
    }

    /// `"Page N of M"`.
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }

    /// Title used when sharing: the book title, plus the page title if any.
    pub fn share_title(&self) -> String {
        match &self.page_title {
            Some(page_title) => format!("{} - {page_title}", self.book_title),
            None => self.book_title.clone(),
        }
    }

    /// Validate a "go to page" request against this book.
    pub fn go_to(&self, page: i64) -> Result<u32> {
        if page < 1 || page as u64 > self.total_pages as u64 {
            return Err(Error::validation("Invalid page number"));
        }
        Ok(page as u32)
    }
}
