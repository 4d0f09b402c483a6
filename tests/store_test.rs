//! Page store contract tests, run against both store implementations.

use folio::book::{PageUpdate, clamp_title};
use folio::store::NEW_PAGE_CONTENT;
use folio::{Book, BookId, DurableStore, Error, MemoryStore, PageStore, ParsedPage};
use tempfile::TempDir;

const BOOK: BookId = BookId(1);

fn parsed(n: u32, text: &str) -> ParsedPage {
    ParsedPage {
        page_number: n,
        content: text.to_string(),
        title: text.to_string(),
    }
}

fn seeded<S: PageStore>(mut store: S, pages: u32) -> S {
    store.put_book(&Book::new(BOOK, "Seeded")).unwrap();
    let pages: Vec<_> = (1..=pages)
        .map(|n| parsed(n, &format!("page {n}")))
        .collect();
    store.replace_all(BOOK, &pages).unwrap();
    store
}

fn numbers<S: PageStore>(store: &S) -> Vec<u32> {
    store
        .list_pages(BOOK)
        .unwrap()
        .iter()
        .map(|p| p.page_number)
        .collect()
}

fn durable() -> (TempDir, DurableStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = DurableStore::open(dir.path()).unwrap();
    (dir, store)
}

// ============================================================================
// Contract
// ============================================================================

fn check_replace_all<S: PageStore>(store: S) {
    let mut store = seeded(store, 3);
    assert_eq!(numbers(&store), vec![1, 2, 3]);

    store.replace_all(BOOK, &[parsed(1, "fresh")]).unwrap();
    assert_eq!(store.count(BOOK).unwrap(), 1);
    assert_eq!(store.get_page(BOOK, 1).unwrap().content, "fresh");
    assert!(matches!(store.get_page(BOOK, 2), Err(Error::NotFound(_))));
}

fn check_gap_fill<S: PageStore>(store: S) {
    let mut store = seeded(store, 3);
    let second = store.get_page(BOOK, 2).unwrap();
    store.delete(second.id).unwrap();
    assert_eq!(numbers(&store), vec![1, 3]);

    let created = store.insert_gap_filled(BOOK).unwrap();
    assert_eq!(created.page_number, 2);
    assert_eq!(created.content, NEW_PAGE_CONTENT);
    assert_ne!(created.id, second.id);

    let appended = store.insert_gap_filled(BOOK).unwrap();
    assert_eq!(appended.page_number, 4);
    assert_eq!(store.count(BOOK).unwrap(), 4);
}

fn check_swap<S: PageStore>(store: S) {
    let mut store = seeded(store, 3);
    let first = store.get_page(BOOK, 1).unwrap();
    let third = store.get_page(BOOK, 3).unwrap();

    store.swap_page_numbers(BOOK, 1, 3).unwrap();
    assert_eq!(store.get_page(BOOK, 3).unwrap().id, first.id);
    assert_eq!(store.get_page(BOOK, 1).unwrap().id, third.id);
    assert_eq!(numbers(&store), vec![1, 2, 3]);

    store.swap_page_numbers(BOOK, 2, 2).unwrap();
    assert_eq!(numbers(&store), vec![1, 2, 3]);

    store.swap_page_numbers(BOOK, 2, 7).unwrap();
    assert_eq!(numbers(&store), vec![1, 3, 7]);

    assert!(matches!(
        store.swap_page_numbers(BOOK, 20, 21),
        Err(Error::NotFound(_))
    ));
}

fn check_update<S: PageStore>(store: S) {
    let mut store = seeded(store, 1);
    let page = store.get_page(BOOK, 1).unwrap();
    let long_title = format!("<h1>{}</h1>", "x".repeat(400));

    let updated = store
        .update(
            page.id,
            PageUpdate {
                title: Some(long_title.clone()),
                content: Some("<p>edited</p>".into()),
            },
        )
        .unwrap();
    assert_eq!(updated.title, clamp_title(&long_title));
    assert!(updated.title.len() <= 255);
    assert_eq!(updated.content, "<p>edited</p>");
    assert_eq!(updated.page_number, 1);

    let content_only = store
        .update(
            page.id,
            PageUpdate {
                title: None,
                content: Some("again".into()),
            },
        )
        .unwrap();
    assert_eq!(content_only.title, updated.title);
    assert_eq!(store.get_page_by_id(page.id).unwrap().content, "again");
}

fn check_books<S: PageStore>(store: S) {
    let mut store = seeded(store, 2);
    store.put_book(&Book::new(BookId(2), "Other")).unwrap();
    store.replace_all(BookId(2), &[parsed(1, "x")]).unwrap();

    store.set_total_pages(BOOK, 2).unwrap();
    assert_eq!(store.book(BOOK).unwrap().total_pages, 2);
    assert_eq!(store.list_books().unwrap().len(), 2);

    assert_eq!(store.delete_book(BOOK).unwrap(), 2);
    assert!(matches!(store.book(BOOK), Err(Error::NotFound(_))));
    assert_eq!(store.count(BOOK).unwrap(), 0);
    assert_eq!(store.count(BookId(2)).unwrap(), 1);
    assert!(matches!(
        store.set_total_pages(BOOK, 1),
        Err(Error::NotFound(_))
    ));
}

fn check_range<S: PageStore>(store: S) {
    let store = seeded(store, 10);
    let window: Vec<u32> = store
        .range(BOOK, 8, 5)
        .unwrap()
        .iter()
        .map(|p| p.page_number)
        .collect();
    assert_eq!(window, vec![9, 10]);
    assert!(store.range(BOOK, 20, 5).unwrap().is_empty());
}

macro_rules! contract_tests {
    ($($name:ident => $check:ident),* $(,)?) => {
        mod memory {
            use super::*;
            $(
                #[test]
                fn $name() {
                    $check(MemoryStore::new());
                }
            )*
        }

        mod durable {
            use super::*;
            $(
                #[test]
                fn $name() {
                    let (_dir, store) = durable();
                    $check(store);
                }
            )*
        }
    };
}

contract_tests! {
    test_replace_all => check_replace_all,
    test_gap_fill => check_gap_fill,
    test_swap => check_swap,
    test_update => check_update,
    test_books => check_books,
    test_range => check_range,
}

// ============================================================================
// Durability
// ============================================================================

#[test]
fn test_durable_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = DurableStore::open(dir.path()).unwrap();
        let mut store = seeded(store, 3);
        store.set_total_pages(BOOK, 3).unwrap();
    }

    let store = DurableStore::open(dir.path()).unwrap();
    assert_eq!(numbers(&store), vec![1, 2, 3]);
    assert_eq!(store.book(BOOK).unwrap().total_pages, 3);
    assert_eq!(store.get_page(BOOK, 2).unwrap().content, "page 2");
}
