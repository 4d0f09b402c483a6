//! The library service: the operations a web or CLI front end calls.
//!
//! [`Library`] wires the parser, a [`PageStore`] and the search engine
//! together behind typed requests. Every operation asks the [`Authorizer`]
//! first, validates its input second, and only then reads or writes. Every
//! mutation refreshes the book's cached page count.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::book::{Book, BookId, Language, Page, PageId, PageSummary, PageUpdate, SearchResult};
use crate::config::Config;
use crate::error::{Error, ParseError, Result};
use crate::import::{self, Format, ParseOptions};
use crate::reader::{Navigation, ReaderView};
use crate::search::{self, SearchOptions};
use crate::store::PageStore;

/// What a caller wants to do with a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Edit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Edit => write!(f, "edit"),
        }
    }
}

/// Decides whether the current caller may act on a book.
pub trait Authorizer {
    fn allows(&self, action: Action, book: BookId) -> bool;
}

/// Permits everything. For tools that run with full rights.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn allows(&self, _action: Action, _book: BookId) -> bool {
        true
    }
}

/// Permits reading only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnly;

impl Authorizer for ReadOnly {
    fn allows(&self, action: Action, _book: BookId) -> bool {
        action == Action::Read
    }
}

/// A book to register.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewBook {
    /// Explicit id; the next free id is used when absent.
    pub id: Option<BookId>,
    pub title: String,
    pub author: Option<String>,
    pub language: Language,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavePageRequest {
    pub book_id: BookId,
    pub page_id: PageId,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeletePageRequest {
    pub book_id: BookId,
    pub page_id: PageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReorderRequest {
    pub book_id: BookId,
    pub from_page: u32,
    pub to_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub book_id: BookId,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCreated {
    pub page_id: PageId,
    pub page_number: u32,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSaved {
    pub page_id: PageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDeleted {
    pub page_number: u32,
    pub remaining_pages: usize,
}

/// Books and their pages, behind permission checks.
pub struct Library<S, A = AllowAll> {
    store: S,
    authorizer: A,
    parse_options: ParseOptions,
    search_options: SearchOptions,
}

impl<S: PageStore> Library<S, AllowAll> {
    /// A library with full rights and default settings.
    pub fn new(store: S) -> Self {
        Self::with_authorizer(store, AllowAll)
    }
}

impl<S: PageStore, A: Authorizer> Library<S, A> {
    pub fn with_authorizer(store: S, authorizer: A) -> Self {
        Self {
            store,
            authorizer,
            parse_options: ParseOptions::default(),
            search_options: SearchOptions::default(),
        }
    }

    /// Take pagination and search settings from `config`.
    pub fn configure(mut self, config: &Config) -> Self {
        self.parse_options = ParseOptions::from(&config.pagination);
        self.search_options = SearchOptions::from(&config.search);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn authorize(&self, action: Action, book: BookId) -> Result<()> {
        if self.authorizer.allows(action, book) {
            Ok(())
        } else {
            warn!(%action, book = %book, "permission denied");
            Err(Error::Permission(format!("cannot {action} book {book}")))
        }
    }

    /// Recount a book's pages and store the count on the book record.
    fn refresh_total(&mut self, book: BookId) -> Result<usize> {
        let total = self.store.count(book)?;
        self.store.set_total_pages(book, total)?;
        Ok(total)
    }

    pub fn add_book(&mut self, new: NewBook) -> Result<Book> {
        let id = match new.id {
            Some(id) => id,
            None => BookId(
                self.store
                    .list_books()?
                    .iter()
                    .map(|b| b.id.0)
                    .max()
                    .unwrap_or(0)
                    + 1,
            ),
        };
        self.authorize(Action::Edit, id)?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::validation("Book title cannot be empty"));
        }
        if id.0 == 0 {
            return Err(Error::validation("Invalid book ID"));
        }

        let book = Book {
            id,
            title: title.to_string(),
            author: new.author.filter(|a| !a.trim().is_empty()),
            language: new.language,
            thumbnail: new.thumbnail,
            description: new.description,
            excerpt: new.excerpt,
            total_pages: self.store.count(id)?,
        };
        self.store.put_book(&book)?;
        info!(book = %id, title = %book.title, "book added");
        Ok(book)
    }

    pub fn book(&self, id: BookId) -> Result<Book> {
        self.authorize(Action::Read, id)?;
        self.store.book(id)
    }

    /// Books the caller may read.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self
            .store
            .list_books()?
            .into_iter()
            .filter(|b| self.authorizer.allows(Action::Read, b.id))
            .collect())
    }

    /// Replace all pages of a book with the pages parsed from an upload.
    ///
    /// `file_name` only decides the format. Nothing is written unless the
    /// document parses into at least one page.
    pub fn import_document(
        &mut self,
        book: BookId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportSummary> {
        self.authorize(Action::Edit, book)?;
        let format = Format::from_path(file_name)?;
        self.store.book(book)?;

        let extension = match format {
            Format::Docx => "docx",
            Format::Doc => "doc",
        };
        let pages = import::parse(bytes, extension, &self.parse_options)?;
        if pages.is_empty() {
            return Err(Error::validation("Document contains no text"));
        }

        self.store.replace_all(book, &pages)?;
        let total_pages = self.refresh_total(book)?;
        info!(book = %book, file_name, total_pages, "document imported");
        Ok(ImportSummary {
            book_id: book,
            total_pages,
        })
    }

    /// Read a document from disk and import it.
    pub fn import_file(&mut self, book: BookId, path: &Path) -> Result<ImportSummary> {
        if !path.is_file() {
            return Err(ParseError::FileNotFound(path.to_path_buf()).into());
        }
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.import_document(book, &file_name, &bytes)
    }

    pub fn get_page(&self, book: BookId, page_number: u32) -> Result<Page> {
        self.authorize(Action::Read, book)?;
        if book.0 == 0 || page_number == 0 {
            return Err(Error::validation("Invalid parameters"));
        }
        self.store.get_page(book, page_number)
    }

    /// Build the reader model for the page `nav` points at.
    ///
    /// The page count is recomputed from the store, and the cached count on
    /// the book is corrected when it has drifted. A missing page is not an
    /// error here: the view simply has no content.
    pub fn reader_view(&mut self, book: BookId, nav: &Navigation) -> Result<ReaderView> {
        self.authorize(Action::Read, book)?;
        let mut record = self.store.book(book)?;

        let total_pages = self.store.count(book)?;
        if record.total_pages != total_pages {
            self.store.set_total_pages(book, total_pages)?;
            record.total_pages = total_pages;
        }

        let page = match self.store.get_page(book, nav.page) {
            Ok(page) => Some(page),
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(ReaderView::new(&record, page.as_ref(), total_pages, nav))
    }

    pub fn search_book(&self, book: BookId, term: &str) -> Result<Vec<SearchResult>> {
        self.authorize(Action::Read, book)?;
        search::search(&self.store, book, term, &self.search_options)
    }

    /// Page listing for the editor.
    pub fn list_pages(&self, book: BookId) -> Result<Vec<PageSummary>> {
        self.authorize(Action::Edit, book)?;
        Ok(self
            .store
            .list_pages(book)?
            .iter()
            .map(Page::summary)
            .collect())
    }

    /// Add a placeholder page at the first free page number.
    pub fn create_page(&mut self, book: BookId) -> Result<PageCreated> {
        self.authorize(Action::Edit, book)?;
        if book.0 == 0 {
            return Err(Error::validation("Invalid book ID"));
        }
        self.store.book(book)?;

        let page = self.store.insert_gap_filled(book)?;
        let total_pages = self.refresh_total(book)?;
        info!(book = %book, page_number = page.page_number, "page created");
        Ok(PageCreated {
            page_id: page.id,
            page_number: page.page_number,
            total_pages,
        })
    }

    pub fn save_page(&mut self, request: SavePageRequest) -> Result<PageSaved> {
        self.authorize(Action::Edit, request.book_id)?;
        if request.book_id.0 == 0 || request.page_id.0 == 0 {
            return Err(Error::validation("Invalid parameters"));
        }
        if request.content.trim().is_empty() {
            return Err(Error::validation("Page content cannot be empty"));
        }

        let existing = self.store.get_page_by_id(request.page_id)?;
        if existing.book_id != request.book_id {
            return Err(Error::not_found("Page"));
        }

        let page = self.store.update(
            request.page_id,
            PageUpdate {
                title: Some(request.title),
                content: Some(request.content),
            },
        )?;
        info!(page = %page.id, page_number = page.page_number, title = %page.title, "page saved");
        Ok(PageSaved { page_id: page.id })
    }

    pub fn delete_page(&mut self, request: DeletePageRequest) -> Result<PageDeleted> {
        self.authorize(Action::Edit, request.book_id)?;
        if request.book_id.0 == 0 || request.page_id.0 == 0 {
            return Err(Error::validation("Invalid parameters"));
        }

        let existing = self.store.get_page_by_id(request.page_id)?;
        if existing.book_id != request.book_id {
            return Err(Error::not_found("Page"));
        }

        let page = self.store.delete(request.page_id)?;
        let remaining_pages = self.refresh_total(request.book_id)?;
        info!(page = %page.id, page_number = page.page_number, remaining_pages, "page deleted");
        Ok(PageDeleted {
            page_number: page.page_number,
            remaining_pages,
        })
    }

    /// Swap the numbers of two pages.
    pub fn reorder_pages(&mut self, request: ReorderRequest) -> Result<()> {
        self.authorize(Action::Edit, request.book_id)?;
        if request.book_id.0 == 0 || request.from_page == 0 || request.to_page == 0 {
            return Err(Error::validation("Invalid parameters"));
        }
        if request.from_page == request.to_page {
            info!(book = %request.book_id, "no reordering needed");
            return Ok(());
        }

        self.store
            .swap_page_numbers(request.book_id, request.from_page, request.to_page)?;
        self.refresh_total(request.book_id)?;
        info!(
            book = %request.book_id,
            from = request.from_page,
            to = request.to_page,
            "pages swapped"
        );
        Ok(())
    }

    /// Delete a book and its pages. Returns how many pages went with it.
    pub fn remove_book(&mut self, book: BookId) -> Result<usize> {
        self.authorize(Action::Edit, book)?;
        let removed = self.store.delete_book(book)?;
        info!(book = %book, removed, "book removed");
        Ok(removed)
    }
}
