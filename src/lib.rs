//! # folio
//!
//! Turn Word documents into paginated, searchable books, and highlight
//! search terms inside a rendered page.
//!
//! ## Features
//!
//! - Parse DOCX and legacy DOC uploads into fixed-size pages
//! - Store pages per book, in memory or in a `redb` database
//! - Tiered full-text search with Arabic and Urdu script normalization
//! - In-page highlighting over a parsed HTML tree
//! - Reader navigation with URL state
//!
//! ## Quick Start
//!
//! ```
//! use folio::{Library, MemoryStore, NewBook, Navigation};
//!
//! let mut library = Library::new(MemoryStore::new());
//! let book = library
//!     .add_book(NewBook { title: "Diwan".into(), ..NewBook::default() })
//!     .unwrap();
//!
//! let created = library.create_page(book.id).unwrap();
//! assert_eq!(created.page_number, 1);
//!
//! let view = library.reader_view(book.id, &Navigation::default()).unwrap();
//! assert_eq!(view.page_label(), "Page 1 of 1");
//! ```
//!
//! ## Highlighting
//!
//! ```
//! use folio::highlight::{highlight_html, HighlightOptions};
//!
//! let (html, count) = highlight_html("<p>نور اور نور</p>", "نور", &HighlightOptions::default());
//! assert_eq!(count, 2);
//! assert!(html.contains("<mark"));
//! ```

pub mod book;
pub mod config;
pub mod error;
pub mod highlight;
pub mod import;
pub mod library;
pub mod normalize;
pub mod reader;
pub mod search;
pub mod store;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use book::{Book, BookId, Language, Page, PageId, PageSummary, ParsedPage, SearchResult};
pub use config::Config;
pub use error::{Error, ParseError, Result};
pub use import::{Format, ParseOptions, parse, parse_file};
pub use library::{
    Action, AllowAll, Authorizer, DeletePageRequest, Library, NewBook, ReadOnly, ReorderRequest,
    SavePageRequest,
};
pub use reader::{Navigation, ReaderView};
pub use store::{MemoryStore, PageStore};

#[cfg(not(target_arch = "wasm32"))]
pub use store::DurableStore;
