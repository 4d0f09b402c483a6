//! Document parser: Word documents in, ordered pages out.
//!
//! Two input formats are understood:
//!
//! - **docx**: the main document part is walked paragraph by paragraph. Each
//!   paragraph becomes one line; explicit page breaks and a character budget
//!   decide where pages end. A body with no paragraphs falls back to the
//!   flat sequence of text runs.
//! - **doc**: the plain-text section of a legacy file is cut by the
//!   character budget alone.
//!
//! # Example
//!
//! ```no_run
//! use folio::import::{parse_file, ParseOptions};
//!
//! let pages = parse_file("book.docx", &ParseOptions::default())?;
//! for page in &pages {
//!     println!("{}: {}", page.page_number, page.title);
//! }
//! # Ok::<(), folio::ParseError>(())
//! ```

mod doc;
mod docx;
mod paginate;

pub use paginate::{EMPTY_PAGE, Paginator, UNTITLED_SECTION, derive_title};

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::book::ParsedPage;
use crate::config::PaginationConfig;
use crate::error::ParseError;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Office Open XML (`.docx`)
    Docx,
    /// Legacy Word (`.doc`)
    Doc,
}

impl Format {
    /// Detect the format from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Result<Self, ParseError> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" => Ok(Format::Docx),
            "doc" => Ok(Format::Doc),
            other => Err(ParseError::UnsupportedFormat(if other.is_empty() {
                "file has no extension".to_string()
            } else {
                format!(".{other}")
            })),
        }
    }

    /// Detect the format from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }
}

/// Pagination knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// A page is cut once its text reaches this many characters.
    pub chars_per_page: usize,
    /// Derived titles longer than this many characters get an ellipsis.
    pub title_max_chars: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chars_per_page: 5000,
            title_max_chars: 100,
        }
    }
}

impl From<&PaginationConfig> for ParseOptions {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            chars_per_page: config.chars_per_page,
            title_max_chars: config.title_max_chars,
        }
    }
}

/// Parse document bytes into pages.
///
/// `extension` is the file extension of the upload (`"docx"` or `"doc"`).
/// An empty list means the document holds no text.
pub fn parse(
    bytes: &[u8],
    extension: &str,
    options: &ParseOptions,
) -> Result<Vec<ParsedPage>, ParseError> {
    let pages = match Format::from_extension(extension)? {
        Format::Docx => parse_docx(bytes, options)?,
        Format::Doc => parse_doc(bytes, options)?,
    };
    debug!(pages = pages.len(), extension, "parsed document");
    Ok(pages)
}

/// Read a document from disk and parse it into pages.
pub fn parse_file(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Vec<ParsedPage>, ParseError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ParseError::FileNotFound(path.to_path_buf()));
    }
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| ParseError::Container(format!("{}: {e}", path.display())))?;

    match format {
        Format::Docx => parse_docx(&bytes, options),
        Format::Doc => parse_doc(&bytes, options),
    }
}

fn parse_docx(bytes: &[u8], options: &ParseOptions) -> Result<Vec<ParsedPage>, ParseError> {
    let body = docx::read_docx(Cursor::new(bytes))?;

    if body.paragraphs.is_empty() {
        let runs: Vec<&str> = body
            .text_runs
            .iter()
            .map(String::as_str)
            .filter(|run| !run.trim().is_empty())
            .collect();
        debug!(runs = runs.len(), "no paragraphs found, paginating raw text runs");
        return Ok(paginate_flat(&runs.join(" "), options));
    }

    let mut paginator = Paginator::new(options);
    for paragraph in &body.paragraphs {
        paginator.push_line(&paragraph.text, paragraph.page_break);
    }
    Ok(paginator.finish())
}

fn parse_doc(bytes: &[u8], options: &ParseOptions) -> Result<Vec<ParsedPage>, ParseError> {
    let text = doc::extract_plain_text(bytes)?;
    Ok(paginate_flat(&text, options))
}

/// Cut text into pages by the character budget only.
fn paginate_flat(text: &str, options: &ParseOptions) -> Vec<ParsedPage> {
    let mut paginator = Paginator::new(options);
    if text.trim().is_empty() {
        return paginator.finish();
    }
    for line in text.split('\n') {
        paginator.push_line(line.strip_suffix('\r').unwrap_or(line), false);
    }
    paginator.finish()
}
