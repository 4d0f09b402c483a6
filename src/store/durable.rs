//! On-disk page store backed by redb.
//!
//! Layout:
//!
//! - `pages`: page id to JSON-encoded [`Page`]
//! - `page_index`: `(book id, page number)` to page id
//! - `books`: book id to JSON-encoded [`Book`]
//! - `meta`: counters (`next_page_id`)
//!
//! Every mutation runs in a single write transaction.

use std::path::Path;

use redb::{Database, ReadableTable, Table, TableDefinition, WriteTransaction};

use crate::book::{Book, BookId, Page, PageId, PageUpdate, ParsedPage, clamp_title};
use crate::error::{Error, Result};
use crate::util::time_now_secs;

use super::{NEW_PAGE_CONTENT, PageStore, next_gap};

const PAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("pages");
const PAGE_INDEX: TableDefinition<(u64, u32), u64> = TableDefinition::new("page_index");
const BOOKS: TableDefinition<u64, &[u8]> = TableDefinition::new("books");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_PAGE_ID: &str = "next_page_id";

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "folio.redb";

/// Map a backend error to `Error::Persistence`, naming the failed step.
fn persist<E: std::fmt::Display>(op: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::Persistence(format!("{op} failed: {e}"))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(persist("encode"))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(persist("decode"))
}

fn load_page<T>(table: &T, id: u64) -> Result<Option<Page>>
where
    T: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id).map_err(persist("get page"))? {
        Some(guard) => decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

fn store_page(table: &mut Table<u64, &'static [u8]>, page: &Page) -> Result<()> {
    let bytes = encode(page)?;
    table
        .insert(page.id.0, bytes.as_slice())
        .map_err(persist("insert page"))?;
    Ok(())
}

fn page_id_at<T>(index: &T, book: BookId, page_number: u32) -> Result<Option<u64>>
where
    T: ReadableTable<(u64, u32), u64>,
{
    Ok(index
        .get((book.0, page_number))
        .map_err(persist("get page index"))?
        .map(|guard| guard.value()))
}

/// Page ids of a book in page number order.
fn book_page_ids<T>(index: &T, book: BookId) -> Result<Vec<(u32, u64)>>
where
    T: ReadableTable<(u64, u32), u64>,
{
    let mut ids = Vec::new();
    for entry in index
        .range((book.0, 0)..=(book.0, u32::MAX))
        .map_err(persist("scan page index"))?
    {
        let (key, value) = entry.map_err(persist("scan page index"))?;
        ids.push((key.value().1, value.value()));
    }
    Ok(ids)
}

/// Page store persisted in a redb database file.
pub struct DurableStore {
    db: Database,
}

impl DurableStore {
    /// Open or create the store in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| {
            Error::Persistence(format!("failed to open redb at {}: {e}", db_path.display()))
        })?;

        // Create every table up front so read transactions never miss one
        let txn = db.begin_write().map_err(persist("begin_write"))?;
        {
            txn.open_table(PAGES).map_err(persist("open_table"))?;
            txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            txn.open_table(BOOKS).map_err(persist("open_table"))?;
            txn.open_table(META).map_err(persist("open_table"))?;
        }
        txn.commit().map_err(persist("commit"))?;

        Ok(Self { db })
    }

    fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_write().map_err(persist("begin_write"))?;
        // Dropping an uncommitted transaction aborts it
        let value = f(&txn)?;
        txn.commit().map_err(persist("commit"))?;
        Ok(value)
    }

    fn allocate_id(txn: &WriteTransaction) -> Result<PageId> {
        let mut meta = txn.open_table(META).map_err(persist("open_table"))?;
        let next = meta
            .get(NEXT_PAGE_ID)
            .map_err(persist("get counter"))?
            .map(|guard| guard.value())
            .unwrap_or(0)
            + 1;
        meta.insert(NEXT_PAGE_ID, next)
            .map_err(persist("update counter"))?;
        Ok(PageId(next))
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}

impl PageStore for DurableStore {
    fn list_pages(&self, book: BookId) -> Result<Vec<Page>> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
        let pages = txn.open_table(PAGES).map_err(persist("open_table"))?;

        let mut out = Vec::new();
        for (_, id) in book_page_ids(&index, book)? {
            if let Some(page) = load_page(&pages, id)? {
                out.push(page);
            }
        }
        Ok(out)
    }

    fn get_page(&self, book: BookId, page_number: u32) -> Result<Page> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
        let id = page_id_at(&index, book, page_number)?.ok_or_else(|| Error::not_found("Page"))?;

        let pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
        load_page(&pages, id)?.ok_or_else(|| Error::not_found("Page"))
    }

    fn get_page_by_id(&self, id: PageId) -> Result<Page> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
        load_page(&pages, id.0)?.ok_or_else(|| Error::not_found("Page"))
    }

    fn count(&self, book: BookId) -> Result<usize> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
        Ok(book_page_ids(&index, book)?.len())
    }

    fn replace_all(&mut self, book: BookId, parsed: &[ParsedPage]) -> Result<()> {
        self.write(|txn| {
            let mut index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;

            for (number, id) in book_page_ids(&index, book)? {
                index
                    .remove((book.0, number))
                    .map_err(persist("remove page index"))?;
                pages.remove(id).map_err(persist("remove page"))?;
            }

            let now = time_now_secs();
            for page in parsed {
                let id = Self::allocate_id(txn)?;
                let page = Page {
                    id,
                    book_id: book,
                    page_number: page.page_number,
                    title: clamp_title(&page.title),
                    content: page.content.clone(),
                    created_at: now,
                    updated_at: now,
                };
                store_page(&mut pages, &page)?;
                index
                    .insert((book.0, page.page_number), id.0)
                    .map_err(persist("insert page index"))?;
            }
            Ok(())
        })
    }

    fn update(&mut self, id: PageId, update: PageUpdate) -> Result<Page> {
        self.write(|txn| {
            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
            let mut page = load_page(&pages, id.0)?.ok_or_else(|| Error::not_found("Page"))?;
            if let Some(title) = update.title {
                page.title = clamp_title(&title);
            }
            if let Some(content) = update.content {
                page.content = content;
            }
            page.updated_at = time_now_secs();
            store_page(&mut pages, &page)?;
            Ok(page)
        })
    }

    fn delete(&mut self, id: PageId) -> Result<Page> {
        self.write(|txn| {
            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
            let page = load_page(&pages, id.0)?.ok_or_else(|| Error::not_found("Page"))?;
            pages.remove(id.0).map_err(persist("remove page"))?;

            let mut index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            index
                .remove((page.book_id.0, page.page_number))
                .map_err(persist("remove page index"))?;
            Ok(page)
        })
    }

    fn insert_gap_filled(&mut self, book: BookId) -> Result<Page> {
        self.write(|txn| {
            let id = Self::allocate_id(txn)?;
            let mut index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            let numbers: Vec<u32> = book_page_ids(&index, book)?
                .into_iter()
                .map(|(number, _)| number)
                .collect();

            let now = time_now_secs();
            let page = Page {
                id,
                book_id: book,
                page_number: next_gap(&numbers),
                title: String::new(),
                content: NEW_PAGE_CONTENT.to_string(),
                created_at: now,
                updated_at: now,
            };

            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
            store_page(&mut pages, &page)?;
            index
                .insert((book.0, page.page_number), id.0)
                .map_err(persist("insert page index"))?;
            Ok(page)
        })
    }

    fn swap_page_numbers(&mut self, book: BookId, a: u32, b: u32) -> Result<()> {
        if a == b {
            return Ok(());
        }
        self.write(|txn| {
            let mut index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            let first = page_id_at(&index, book, a)?;
            let second = page_id_at(&index, book, b)?;
            if first.is_none() && second.is_none() {
                return Err(Error::not_found("Page"));
            }

            for number in [a, b] {
                index
                    .remove((book.0, number))
                    .map_err(persist("update page index"))?;
            }

            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
            let now = time_now_secs();
            for (id, number) in [(first, b), (second, a)] {
                let Some(id) = id else { continue };
                let mut page = load_page(&pages, id)?.ok_or_else(|| Error::not_found("Page"))?;
                page.page_number = number;
                page.updated_at = now;
                store_page(&mut pages, &page)?;
                index
                    .insert((book.0, number), id)
                    .map_err(persist("update page index"))?;
            }
            Ok(())
        })
    }

    fn put_book(&mut self, book: &Book) -> Result<()> {
        let bytes = encode(book)?;
        self.write(|txn| {
            let mut books = txn.open_table(BOOKS).map_err(persist("open_table"))?;
            books
                .insert(book.id.0, bytes.as_slice())
                .map_err(persist("insert book"))?;
            Ok(())
        })
    }

    fn book(&self, id: BookId) -> Result<Book> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let books = txn.open_table(BOOKS).map_err(persist("open_table"))?;
        let guard = books
            .get(id.0)
            .map_err(persist("get book"))?
            .ok_or_else(|| Error::not_found("Book"))?;
        decode(guard.value())
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let txn = self.db.begin_read().map_err(persist("begin_read"))?;
        let books = txn.open_table(BOOKS).map_err(persist("open_table"))?;
        let mut out = Vec::new();
        for entry in books.iter().map_err(persist("scan books"))? {
            let (_, value) = entry.map_err(persist("scan books"))?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn set_total_pages(&mut self, id: BookId, total_pages: usize) -> Result<()> {
        self.write(|txn| {
            let mut books = txn.open_table(BOOKS).map_err(persist("open_table"))?;
            let mut book: Book = match books.get(id.0).map_err(persist("get book"))? {
                Some(guard) => decode(guard.value())?,
                None => return Err(Error::not_found("Book")),
            };
            book.total_pages = total_pages;
            let bytes = encode(&book)?;
            books
                .insert(id.0, bytes.as_slice())
                .map_err(persist("update book"))?;
            Ok(())
        })
    }

    fn delete_book(&mut self, id: BookId) -> Result<usize> {
        self.write(|txn| {
            let mut books = txn.open_table(BOOKS).map_err(persist("open_table"))?;
            if books.remove(id.0).map_err(persist("remove book"))?.is_none() {
                return Err(Error::not_found("Book"));
            }

            let mut index = txn.open_table(PAGE_INDEX).map_err(persist("open_table"))?;
            let mut pages = txn.open_table(PAGES).map_err(persist("open_table"))?;
            let ids = book_page_ids(&index, id)?;
            for (number, page_id) in &ids {
                index
                    .remove((id.0, *number))
                    .map_err(persist("remove page index"))?;
                pages.remove(*page_id).map_err(persist("remove page"))?;
            }
            Ok(ids.len())
        })
    }
}
