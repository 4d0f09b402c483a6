//! Page storage.
//!
//! [`PageStore`] is the seam between the library service and whatever keeps
//! pages around. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: ordered maps, for tests and one-shot tools.
//! - [`DurableStore`]: a `redb` database on disk (native targets only).
//!
//! Every operation is scoped to one book. Page numbers within a book are
//! 1-based and unique; `replace_all` is atomic, so a failed import never
//! leaves a partial page set behind.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod durable;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use durable::DurableStore;

use crate::book::{Book, BookId, Page, PageId, PageUpdate, ParsedPage};
use crate::error::Result;

/// Content given to a page created from the editor.
pub const NEW_PAGE_CONTENT: &str = "<p>New page content goes here...</p>";

/// Durable keyed collection of books and their pages.
///
/// Mutating operations take `&mut self`; a store is owned by one service.
pub trait PageStore {
    /// All pages of a book, ordered by page number.
    fn list_pages(&self, book: BookId) -> Result<Vec<Page>>;

    /// Up to `limit` pages of a book starting at position `offset` in page
    /// number order.
    fn range(&self, book: BookId, offset: usize, limit: usize) -> Result<Vec<Page>> {
        Ok(self
            .list_pages(book)?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    /// The page with the given number, or `NotFound`.
    fn get_page(&self, book: BookId, page_number: u32) -> Result<Page>;

    /// The page with the given id, or `NotFound`.
    fn get_page_by_id(&self, id: PageId) -> Result<Page>;

    /// Number of pages stored for a book.
    fn count(&self, book: BookId) -> Result<usize>;

    /// Delete every page of the book and insert `pages` in one transaction.
    fn replace_all(&mut self, book: BookId, pages: &[ParsedPage]) -> Result<()>;

    /// Apply an in-place edit and return the updated page.
    fn update(&mut self, id: PageId, update: PageUpdate) -> Result<Page>;

    /// Remove one page and return it. Other pages keep their numbers.
    fn delete(&mut self, id: PageId) -> Result<Page>;

    /// Create a page at the smallest unused page number.
    fn insert_gap_filled(&mut self, book: BookId) -> Result<Page>;

    /// Exchange the numbers of two pages. Equal numbers are a no-op; when
    /// only one of the numbers is taken, that page moves to the free one.
    /// `NotFound` when neither page exists.
    fn swap_page_numbers(&mut self, book: BookId, a: u32, b: u32) -> Result<()>;

    /// Insert or replace a book record.
    fn put_book(&mut self, book: &Book) -> Result<()>;

    /// The book with the given id, or `NotFound`.
    fn book(&self, id: BookId) -> Result<Book>;

    /// All book records, ordered by id.
    fn list_books(&self) -> Result<Vec<Book>>;

    /// Update the cached page count of a book.
    fn set_total_pages(&mut self, id: BookId, total_pages: usize) -> Result<()>;

    /// Delete a book and all of its pages. Returns the number of pages removed.
    fn delete_book(&mut self, id: BookId) -> Result<usize>;
}

/// Smallest positive page number not in `numbers`.
///
/// `numbers` must be sorted ascending.
///
/// ```
/// use folio::store::next_gap;
///
/// assert_eq!(next_gap(&[1, 2, 4]), 3);
/// assert_eq!(next_gap(&[1, 2, 3]), 4);
/// assert_eq!(next_gap(&[]), 1);
/// ```
pub fn next_gap(numbers: &[u32]) -> u32 {
    let mut candidate = 1;
    for &n in numbers {
        if n == candidate {
            candidate += 1;
        } else if n > candidate {
            break;
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_gap_skips_duplicates() {
        assert_eq!(next_gap(&[1, 1, 2, 5]), 3);
    }

    #[test]
    fn test_next_gap_missing_first() {
        assert_eq!(next_gap(&[2, 3]), 1);
    }
}
