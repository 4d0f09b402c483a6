//! folio - paginated books from Word documents

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use folio::highlight::{HighlightOptions, highlight_html};
use folio::{
    BookId, Config, DeletePageRequest, DurableStore, Language, Library, Navigation, NewBook,
    PageId, ReorderRequest, SavePageRequest,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Paginated, searchable books from Word documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio add-book \"Diwan-e-Ghalib\" --author Ghalib
    folio import 1 diwan.docx          Split a document into pages
    folio show 1 --page 3 --highlight dil
    folio search 1 \"dil\"")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the page database (overrides the config file)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a book
    AddBook {
        title: String,
        #[arg(long)]
        id: Option<u64>,
        #[arg(long)]
        author: Option<String>,
        /// urdu, arabic or mixed
        #[arg(long, default_value = "urdu")]
        language: Language,
        #[arg(long)]
        description: Option<String>,
    },
    /// List registered books
    Books,
    /// Replace a book's pages with the pages of a .docx or .doc file
    Import { book: u64, file: PathBuf },
    /// List a book's pages
    Pages { book: u64 },
    /// Render one page of a book
    Show {
        book: u64,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Highlight a term in the rendered page
        #[arg(long)]
        highlight: Option<String>,
    },
    /// Search a book
    Search { book: u64, term: String },
    /// Add an empty page at the first free page number
    CreatePage { book: u64 },
    /// Replace a page's title and content
    SavePage {
        book: u64,
        page_id: u64,
        #[arg(long, default_value = "")]
        title: String,
        /// File holding the new content
        content: PathBuf,
    },
    /// Delete a page
    DeletePage { book: u64, page_id: u64 },
    /// Swap the numbers of two pages
    Reorder { book: u64, from: u32, to: u32 },
    /// Delete a book and all of its pages
    RemoveBook { book: u64 },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> folio::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let store = DurableStore::open(&config.data_dir)?;
    let mut library = Library::new(store).configure(&config);
    let json = cli.json;

    match cli.command {
        Command::AddBook {
            title,
            id,
            author,
            language,
            description,
        } => {
            let book = library.add_book(NewBook {
                id: id.map(BookId),
                title,
                author,
                language,
                description,
                ..NewBook::default()
            })?;
            emit(json, &book, || println!("Added book {}: {}", book.id, book.title))
        }
        Command::Books => {
            let books = library.list_books()?;
            emit(json, &books, || {
                for book in &books {
                    println!("{:>4}  {} ({} pages)", book.id, book.title, book.total_pages);
                }
            })
        }
        Command::Import { book, file } => {
            let summary = library.import_file(BookId(book), &file)?;
            emit(json, &summary, || {
                println!("Imported {} pages into book {book}", summary.total_pages)
            })
        }
        Command::Pages { book } => {
            let pages = library.list_pages(BookId(book))?;
            emit(json, &pages, || {
                for page in &pages {
                    println!("{:>4}  [{}] {}", page.page_number, page.id, page.title);
                }
            })
        }
        Command::Show {
            book,
            page,
            highlight,
        } => {
            let nav = Navigation {
                page: page.max(1),
                highlight,
            };
            let mut view = library.reader_view(BookId(book), &nav)?;
            let mut matches = None;
            if let (Some(term), Some(html)) = (view.highlight.clone(), view.content_html.clone()) {
                let options = HighlightOptions::from(&config.highlight);
                let (marked, count) = highlight_html(&html, &term, &options);
                view.content_html = Some(marked);
                matches = Some(count);
            }
            emit(json, &view, || {
                println!("{} ({})", view.share_title(), view.page_label());
                if let Some(count) = matches {
                    println!("{count} matches");
                }
                println!();
                match &view.content_html {
                    Some(html) => println!("{html}"),
                    None => println!("Page not found"),
                }
            })
        }
        Command::Search { book, term } => {
            let results = library.search_book(BookId(book), &term)?;
            emit(json, &results, || {
                if results.is_empty() {
                    println!("No results for \"{term}\"");
                }
                for result in &results {
                    println!("Page {}: {}", result.page_number, result.title);
                    println!("    {}", result.snippet);
                }
            })
        }
        Command::CreatePage { book } => {
            let created = library.create_page(BookId(book))?;
            emit(json, &created, || {
                println!(
                    "Created page {} ({} pages total)",
                    created.page_number, created.total_pages
                )
            })
        }
        Command::SavePage {
            book,
            page_id,
            title,
            content,
        } => {
            let content = std::fs::read_to_string(&content)?;
            let saved = library.save_page(SavePageRequest {
                book_id: BookId(book),
                page_id: PageId(page_id),
                title,
                content,
            })?;
            emit(json, &saved, || println!("Page updated successfully"))
        }
        Command::DeletePage { book, page_id } => {
            let deleted = library.delete_page(DeletePageRequest {
                book_id: BookId(book),
                page_id: PageId(page_id),
            })?;
            emit(json, &deleted, || {
                println!(
                    "Deleted page {} ({} pages left)",
                    deleted.page_number, deleted.remaining_pages
                )
            })
        }
        Command::Reorder { book, from, to } => {
            library.reorder_pages(ReorderRequest {
                book_id: BookId(book),
                from_page: from,
                to_page: to,
            })?;
            if !json {
                if from == to {
                    println!("No reordering needed");
                } else {
                    println!("Pages reordered successfully");
                }
            }
            Ok(())
        }
        Command::RemoveBook { book } => {
            let removed = library.remove_book(BookId(book))?;
            emit(json, &removed, || {
                println!("Removed book {book} and {removed} pages")
            })
        }
    }
}

/// Print `value` as JSON, or run `human` for plain output.
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> folio::Result<()> {
    if json {
        let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
        println!("{text}");
    } else {
        human();
    }
    Ok(())
}
