//! Data model shared by the parser, the page store and the library API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::util::{collapse_whitespace, strip_tags, truncate_utf8};

/// Maximum number of bytes a stored page title may occupy.
pub const MAX_TITLE_BYTES: usize = 255;

/// Titles longer than this many bytes are shortened with an ellipsis.
const TITLE_SOFT_LIMIT: usize = 200;

/// Identifier of a book, owned by the surrounding application.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BookId(pub u64);

/// Identifier of a stored page row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The script a book is primarily written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Urdu,
    Arabic,
    /// Urdu and Arabic together
    Mixed,
}

impl Language {
    /// All supported languages render right-to-left.
    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Urdu | Language::Arabic | Language::Mixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Urdu => "urdu",
            Language::Arabic => "arabic",
            Language::Mixed => "mixed",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urdu" => Ok(Language::Urdu),
            "arabic" => Ok(Language::Arabic),
            "mixed" => Ok(Language::Mixed),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

/// Book metadata. The page count is a cache derived from the page store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
    pub language: Language,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub excerpt: Option<String>,
    pub total_pages: usize,
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One stored page of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub book_id: BookId,
    /// 1-based, unique within the book.
    pub page_number: u32,
    pub title: String,
    pub content: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Page {
    pub fn summary(&self) -> PageSummary {
        PageSummary {
            id: self.id,
            page_number: self.page_number,
            title: self.title.clone(),
        }
    }
}

/// The lightweight listing row used by the page editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub page_number: u32,
    pub title: String,
}

/// A page produced by the document parser, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPage {
    pub page_number: u32,
    pub content: String,
    pub title: String,
}

/// Fields changed by an in-place page edit. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// How a search result was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// The whole term appears verbatim in content or title.
    Substring,
    /// Every word of the term appears somewhere in the page.
    AllWords,
    /// The term appears once markup is stripped and case is folded.
    Stripped,
}

/// One page matching a search, with the term that matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub page_id: PageId,
    pub page_number: u32,
    pub title: String,
    pub term: String,
    pub tier: MatchTier,
    pub snippet: String,
}

/// Make a title safe to store: plain text, single-spaced, bounded in bytes.
///
/// Titles over 200 bytes are cut at a character boundary at or below 197
/// bytes and get `"..."` appended. The result never exceeds 255 bytes.
///
/// ```
/// use folio::book::clamp_title;
///
/// assert_eq!(clamp_title("<b>Chapter</b>   One"), "Chapter One");
/// assert!(clamp_title(&"ب".repeat(300)).len() <= 200);
/// ```
pub fn clamp_title(raw: &str) -> String {
    let mut title = collapse_whitespace(&strip_tags(raw));

    if title.len() > TITLE_SOFT_LIMIT {
        title = format!("{}...", truncate_utf8(&title, TITLE_SOFT_LIMIT - 3));
    }

    if title.len() > MAX_TITLE_BYTES {
        title = truncate_utf8(&title, MAX_TITLE_BYTES).to_string();
    }

    title
}
