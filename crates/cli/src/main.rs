use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use libris_catalog::{Book, BookUpdate, Catalog, JsonFileStore, DEFAULT_RECOMMENDATIONS};
use libris_kernel::settings::Settings;

/// Offline catalog administration. Operates directly on the store file the
/// server uses; do not run while the server is writing (single-writer
/// persistence, last write wins).
#[derive(Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    /// Path to the catalog store; defaults to the configured storage path.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every book in catalog order
    List,
    /// Show a single book as JSON
    Show { id: String },
    /// Add a book to the catalog
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        genre: String,
        #[arg(long)]
        year: i32,
    },
    /// Update the provided fields of a book
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Remove a book permanently
    Delete { id: String },
    /// Check a book out to a borrower
    Checkout { id: String, borrower: String },
    /// Return a checked-out book
    Checkin { id: String },
    /// Search title, author, genre, and year text
    Search { query: String },
    /// Recommend books related to the given one
    Recommend {
        id: String,
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATIONS)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load libris settings")?;
    let path = cli
        .store
        .unwrap_or_else(|| PathBuf::from(&settings.storage.path));
    tracing::debug!(store = %path.display(), "catalog store selected");

    let mut catalog = Catalog::load(Box::new(JsonFileStore::new(&path)))
        .with_context(|| format!("failed to open catalog store at {}", path.display()))?;

    match cli.command {
        Command::List => {
            for book in catalog.books() {
                print_line(book);
            }
        }
        Command::Show { id } => match catalog.get(&id) {
            Some(book) => println!("{}", serde_json::to_string_pretty(book)?),
            None => bail!("no book with id {id}"),
        },
        Command::Add {
            title,
            author,
            genre,
            year,
        } => {
            let book = catalog.add(&title, &author, &genre, year)?;
            println!("added {} ({})", book.title, book.id);
        }
        Command::Edit {
            id,
            title,
            author,
            genre,
            year,
        } => {
            let update = BookUpdate {
                title,
                author,
                genre,
                publication_year: year,
            };
            let book = catalog.edit(&id, update)?;
            println!("updated {} ({})", book.title, book.id);
        }
        Command::Delete { id } => {
            catalog.delete(&id)?;
            println!("deleted {id}");
        }
        Command::Checkout { id, borrower } => {
            let book = catalog.check_out(&id, &borrower)?;
            println!("checked out {} to {borrower}", book.title);
        }
        Command::Checkin { id } => {
            let book = catalog.check_in(&id)?;
            println!("checked in {}", book.title);
        }
        Command::Search { query } => {
            for book in catalog.search(&query) {
                print_line(book);
            }
        }
        Command::Recommend { id, count } => {
            if catalog.get(&id).is_none() {
                bail!("no book with id {id}");
            }
            for book in catalog.recommend(&id, count) {
                print_line(book);
            }
        }
    }

    Ok(())
}

fn print_line(book: &Book) {
    let status = if book.is_checked_out {
        match &book.checked_out_by {
            Some(borrower) => format!("checked out to {borrower}"),
            None => "checked out".to_string(),
        }
    } else {
        "available".to_string()
    };
    println!(
        "{}  {} by {} ({}, {})  [{}]",
        book.id, book.title, book.author, book.genre, book.publication_year, status
    );
}
