//! In-memory page store.

use std::collections::BTreeMap;

use crate::book::{Book, BookId, Page, PageId, PageUpdate, ParsedPage, clamp_title};
use crate::error::{Error, Result};
use crate::util::time_now_secs;

use super::{NEW_PAGE_CONTENT, PageStore, next_gap};

/// Page store backed by ordered maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    books: BTreeMap<BookId, Book>,
    pages: BTreeMap<PageId, Page>,
    next_page_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> PageId {
        self.next_page_id += 1;
        PageId(self.next_page_id)
    }

    fn page_id_at(&self, book: BookId, page_number: u32) -> Option<PageId> {
        self.pages
            .values()
            .find(|p| p.book_id == book && p.page_number == page_number)
            .map(|p| p.id)
    }

    fn numbers(&self, book: BookId) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .pages
            .values()
            .filter(|p| p.book_id == book)
            .map(|p| p.page_number)
            .collect();
        numbers.sort_unstable();
        numbers
    }
}

impl PageStore for MemoryStore {
    fn list_pages(&self, book: BookId) -> Result<Vec<Page>> {
        let mut pages: Vec<Page> = self
            .pages
            .values()
            .filter(|p| p.book_id == book)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    fn get_page(&self, book: BookId, page_number: u32) -> Result<Page> {
        self.page_id_at(book, page_number)
            .and_then(|id| self.pages.get(&id))
            .cloned()
            .ok_or_else(|| Error::not_found("Page"))
    }

    fn get_page_by_id(&self, id: PageId) -> Result<Page> {
        self.pages
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Page"))
    }

    fn count(&self, book: BookId) -> Result<usize> {
        Ok(self.pages.values().filter(|p| p.book_id == book).count())
    }

    fn replace_all(&mut self, book: BookId, pages: &[ParsedPage]) -> Result<()> {
        self.pages.retain(|_, p| p.book_id != book);

        let now = time_now_secs();
        for parsed in pages {
            let id = self.allocate_id();
            self.pages.insert(
                id,
                Page {
                    id,
                    book_id: book,
                    page_number: parsed.page_number,
                    title: clamp_title(&parsed.title),
                    content: parsed.content.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Ok(())
    }

    fn update(&mut self, id: PageId, update: PageUpdate) -> Result<Page> {
        let page = self
            .pages
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Page"))?;
        if let Some(title) = update.title {
            page.title = clamp_title(&title);
        }
        if let Some(content) = update.content {
            page.content = content;
        }
        page.updated_at = time_now_secs();
        Ok(page.clone())
    }

    fn delete(&mut self, id: PageId) -> Result<Page> {
        self.pages
            .remove(&id)
            .ok_or_else(|| Error::not_found("Page"))
    }

    fn insert_gap_filled(&mut self, book: BookId) -> Result<Page> {
        let page_number = next_gap(&self.numbers(book));
        let id = self.allocate_id();
        let now = time_now_secs();
        let page = Page {
            id,
            book_id: book,
            page_number,
            title: String::new(),
            content: NEW_PAGE_CONTENT.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.pages.insert(id, page.clone());
        Ok(page)
    }

    fn swap_page_numbers(&mut self, book: BookId, a: u32, b: u32) -> Result<()> {
        if a == b {
            return Ok(());
        }
        let first = self.page_id_at(book, a);
        let second = self.page_id_at(book, b);
        if first.is_none() && second.is_none() {
            return Err(Error::not_found("Page"));
        }

        let now = time_now_secs();
        for (id, number) in [(first, b), (second, a)] {
            let Some(id) = id else { continue };
            if let Some(page) = self.pages.get_mut(&id) {
                page.page_number = number;
                page.updated_at = now;
            }
        }
        Ok(())
    }

    fn put_book(&mut self, book: &Book) -> Result<()> {
        self.books.insert(book.id, book.clone());
        Ok(())
    }

    fn book(&self, id: BookId) -> Result<Book> {
        self.books
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Book"))
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.books.values().cloned().collect())
    }

    fn set_total_pages(&mut self, id: BookId, total_pages: usize) -> Result<()> {
        let book = self
            .books
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Book"))?;
        book.total_pages = total_pages;
        Ok(())
    }

    fn delete_book(&mut self, id: BookId) -> Result<usize> {
        self.books
            .remove(&id)
            .ok_or_else(|| Error::not_found("Book"))?;
        let before = self.pages.len();
        self.pages.retain(|_, p| p.book_id != id);
        Ok(before - self.pages.len())
    }
}
