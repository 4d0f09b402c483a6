//! End-to-end tests through the library service.

mod common;

use common::{docx, legacy_doc};
use folio::highlight::{HighlightOptions, highlight_html};
use folio::library::PageCreated;
use folio::{
    Action, Authorizer, BookId, Config, DeletePageRequest, DurableStore, Error, Language, Library,
    MemoryStore, Navigation, NewBook, PageId, PageStore, ParseError, ReadOnly, ReorderRequest,
    SavePageRequest,
};

fn library() -> (Library<MemoryStore>, BookId) {
    let mut library = Library::new(MemoryStore::new());
    let book = library
        .add_book(NewBook {
            title: "Diwan-e-Ghalib".into(),
            author: Some("Ghalib".into()),
            language: Language::Urdu,
            ..NewBook::default()
        })
        .unwrap();
    (library, book.id)
}

fn page_numbers(library: &Library<MemoryStore>, book: BookId) -> Vec<u32> {
    library
        .list_pages(book)
        .unwrap()
        .iter()
        .map(|p| p.page_number)
        .collect()
}

#[test]
fn test_import_splits_and_caches_count() {
    let (mut library, book) = library();
    let bytes = docx(&["a".repeat(12_000).as_str()]);

    let summary = library.import_document(book, "diwan.docx", &bytes).unwrap();
    assert_eq!(summary.total_pages, 3);
    assert_eq!(page_numbers(&library, book), vec![1, 2, 3]);
    assert_eq!(library.book(book).unwrap().total_pages, 3);
}

#[test]
fn test_reimport_replaces_pages() {
    let (mut library, book) = library();
    let long = "a".repeat(12_000);
    library.import_document(book, "one.docx", &docx(&[long.as_str()])).unwrap();
    library
        .import_document(book, "two.doc", &legacy_doc("Only page"))
        .unwrap();

    assert_eq!(page_numbers(&library, book), vec![1]);
    assert_eq!(library.get_page(book, 1).unwrap().content, "Only page");
    assert_eq!(library.book(book).unwrap().total_pages, 1);
}

#[test]
fn test_empty_import_keeps_existing_pages() {
    let (mut library, book) = library();
    library
        .import_document(book, "one.docx", &docx(&["Kept"]))
        .unwrap();

    let err = library
        .import_document(book, "blank.docx", &docx(&["  "]))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(library.get_page(book, 1).unwrap().content, "Kept");
}

#[test]
fn test_import_errors() {
    let (mut library, book) = library();
    assert!(matches!(
        library.import_document(book, "scan.pdf", b"%PDF"),
        Err(Error::Parse(ParseError::UnsupportedFormat(_)))
    ));
    assert!(matches!(
        library.import_document(book, "broken.docx", b"garbage"),
        Err(Error::Parse(ParseError::Container(_)))
    ));
    assert!(matches!(
        library.import_document(BookId(404), "a.docx", &docx(&["x"])),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_import_file() {
    let (mut library, book) = library();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.docx");
    std::fs::write(&path, docx(&["From disk"])).unwrap();

    assert_eq!(library.import_file(book, &path).unwrap().total_pages, 1);
    assert!(matches!(
        library.import_file(book, &dir.path().join("missing.docx")),
        Err(Error::Parse(ParseError::FileNotFound(_)))
    ));
}

#[test]
fn test_delete_then_create_fills_gap() {
    let (mut library, book) = library();
    library
        .import_document(book, "d.docx", &docx(&["a".repeat(12_000).as_str()]))
        .unwrap();

    let second = library.get_page(book, 2).unwrap();
    let deleted = library
        .delete_page(DeletePageRequest {
            book_id: book,
            page_id: second.id,
        })
        .unwrap();
    assert_eq!(deleted.page_number, 2);
    assert_eq!(deleted.remaining_pages, 2);
    assert_eq!(page_numbers(&library, book), vec![1, 3]);
    assert_eq!(library.book(book).unwrap().total_pages, 2);

    let PageCreated {
        page_number,
        total_pages,
        ..
    } = library.create_page(book).unwrap();
    assert_eq!(page_number, 2);
    assert_eq!(total_pages, 3);
    assert_eq!(library.book(book).unwrap().total_pages, 3);
}

#[test]
fn test_save_page() {
    let (mut library, book) = library();
    let created = library.create_page(book).unwrap();

    let saved = library
        .save_page(SavePageRequest {
            book_id: book,
            page_id: created.page_id,
            title: "  <b>Revised</b>  title ".into(),
            content: "<p>نیا متن</p>".into(),
        })
        .unwrap();
    assert_eq!(saved.page_id, created.page_id);

    let page = library.get_page(book, 1).unwrap();
    assert_eq!(page.title, "Revised title");
    assert_eq!(page.content, "<p>نیا متن</p>");

    assert!(matches!(
        library.save_page(SavePageRequest {
            book_id: book,
            page_id: PageId(0),
            title: String::new(),
            content: "x".into(),
        }),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        library.save_page(SavePageRequest {
            book_id: book,
            page_id: PageId(999),
            title: String::new(),
            content: "x".into(),
        }),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_reorder_swaps_numbers() {
    let (mut library, book) = library();
    library
        .import_document(book, "d.docx", &docx(&["a".repeat(12_000).as_str()]))
        .unwrap();
    let first = library.get_page(book, 1).unwrap();
    let third = library.get_page(book, 3).unwrap();

    library
        .reorder_pages(ReorderRequest {
            book_id: book,
            from_page: 1,
            to_page: 3,
        })
        .unwrap();
    assert_eq!(library.get_page(book, 1).unwrap().id, third.id);
    assert_eq!(library.get_page(book, 3).unwrap().id, first.id);

    library
        .reorder_pages(ReorderRequest {
            book_id: book,
            from_page: 2,
            to_page: 2,
        })
        .unwrap();
    assert_eq!(page_numbers(&library, book), vec![1, 2, 3]);

    assert!(matches!(
        library.reorder_pages(ReorderRequest {
            book_id: book,
            from_page: 0,
            to_page: 1,
        }),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_reader_view_and_highlight() {
    let (mut library, book) = library();
    library
        .import_document(book, "d.doc", &legacy_doc("دل ناداں تجھے ہوا کیا ہے"))
        .unwrap();

    let nav = Navigation::from_query("?page=1&highlight=%D8%AF%D9%84");
    let view = library.reader_view(book, &nav).unwrap();
    assert_eq!(view.page_label(), "Page 1 of 1");
    assert_eq!(view.direction.as_str(), "rtl");
    assert_eq!(view.highlight.as_deref(), Some("دل"));
    assert_eq!(view.prev_page, None);
    assert_eq!(view.next_page, None);

    let html = view.content_html.unwrap();
    let (marked, count) = highlight_html(&html, "دل", &HighlightOptions::default());
    assert_eq!(count, 1);
    assert!(marked.contains(">دل</mark>"));
}

#[test]
fn test_reader_view_missing_page_and_drift() {
    let (mut library, book) = library();
    library.create_page(book).unwrap();

    // Push the cached count out of sync behind the library's back
    let mut store = library.into_store();
    store.set_total_pages(book, 40).unwrap();
    let mut library = Library::new(store);

    let view = library.reader_view(book, &Navigation::page(9)).unwrap();
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.content_html, None);
    assert_eq!(library.book(book).unwrap().total_pages, 1);
}

#[test]
fn test_search_through_library() {
    let (mut library, book) = library();
    library
        .import_document(book, "d.docx", &docx(&["Hazaron khwahishen aisi"]))
        .unwrap();

    let results = library.search_book(book, "khwahishen").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].page_number, 1);
    assert!(library.search_book(book, "k").is_err());
}

#[test]
fn test_remove_book() {
    let (mut library, book) = library();
    library.create_page(book).unwrap();
    library.create_page(book).unwrap();

    assert_eq!(library.remove_book(book).unwrap(), 2);
    assert!(matches!(library.book(book), Err(Error::NotFound(_))));
    assert!(library.list_books().unwrap().is_empty());
}

struct OnlyBook(BookId);

impl Authorizer for OnlyBook {
    fn allows(&self, _action: Action, book: BookId) -> bool {
        book == self.0
    }
}

#[test]
fn test_permission_checked_before_anything_else() {
    let mut store = MemoryStore::new();
    store
        .put_book(&folio::Book::new(BookId(1), "Mine"))
        .unwrap();
    store
        .put_book(&folio::Book::new(BookId(2), "Theirs"))
        .unwrap();
    let mut library = Library::with_authorizer(store, OnlyBook(BookId(1)));

    // Even an invalid request is refused for permission first
    let err = library
        .save_page(SavePageRequest {
            book_id: BookId(2),
            page_id: PageId(0),
            title: String::new(),
            content: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Permission(_)));

    assert!(matches!(library.create_page(BookId(2)), Err(Error::Permission(_))));
    assert_eq!(library.list_books().unwrap().len(), 1);
    assert!(library.create_page(BookId(1)).is_ok());
}

#[test]
fn test_read_only_library_can_read() {
    let (mut library, book) = library();
    library.create_page(book).unwrap();
    let mut library = Library::with_authorizer(library.into_store(), ReadOnly);

    assert!(library.reader_view(book, &Navigation::default()).is_ok());
    assert!(matches!(library.list_pages(book), Err(Error::Permission(_))));
    assert!(matches!(library.remove_book(book), Err(Error::Permission(_))));
}

#[test]
fn test_configured_durable_library() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_toml("[pagination]\nchars_per_page = 10\n").unwrap();

    {
        let store = DurableStore::open(dir.path()).unwrap();
        let mut library = Library::new(store).configure(&config);
        let book = library
            .add_book(NewBook {
                id: Some(BookId(5)),
                title: "Short pages".into(),
                ..NewBook::default()
            })
            .unwrap();
        let summary = library
            .import_document(book.id, "s.docx", &docx(&["abcdefghijklmnopqrstuvwxy"]))
            .unwrap();
        assert_eq!(summary.total_pages, 3);
    }

    let library = Library::new(DurableStore::open(dir.path()).unwrap());
    assert_eq!(library.book(BookId(5)).unwrap().total_pages, 3);
    assert_eq!(library.get_page(BookId(5), 3).unwrap().content, "uvwxy");
}
