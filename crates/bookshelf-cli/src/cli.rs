use std::path::PathBuf;

use bookshelf_core::search::{CatalogOrder, WishlistOrder};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "Keep a book wishlist in sync with your Bookshelf server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8080/api
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a book to the wishlist
    #[command(alias = "new")]
    Add {
        /// Book title
        #[arg(long)]
        title: Option<String>,
        /// Book author
        #[arg(long)]
        author: Option<String>,
        /// ISBN-10 or ISBN-13 (dashes and spaces are ignored)
        #[arg(long)]
        isbn: Option<String>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
        /// Price you are willing to pay
        #[arg(long, value_name = "AMOUNT")]
        price: Option<f64>,
        /// Fill missing details from the server's ISBN lookup
        #[arg(long)]
        lookup: bool,
    },
    /// List the wishlist
    List {
        /// Only show items matching this text
        #[arg(short, long)]
        query: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = WishlistSort::Recent)]
        order: WishlistSort,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show changes not yet confirmed by the server
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a wishlist item
    Delete {
        /// Wishlist item id, as shown by `list`
        id: String,
    },
    /// Move a wishlist item into your library
    Purchase {
        /// Wishlist item id, as shown by `list`
        id: String,
    },
    /// Push local changes and pull the server's wishlist
    Sync {
        /// Keep running and sync on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// List books in your library
    Books {
        /// Refresh the local copy from the server first
        #[arg(long)]
        refresh: bool,
        /// Only show books matching this text
        #[arg(short, long)]
        query: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = BookSort::Recent)]
        order: BookSort,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up book details by ISBN
    Lookup {
        /// ISBN-10 or ISBN-13
        isbn: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum WishlistSort {
    Recent,
    Title,
    Author,
}

impl From<WishlistSort> for WishlistOrder {
    fn from(sort: WishlistSort) -> Self {
        match sort {
            WishlistSort::Recent => Self::Recent,
            WishlistSort::Title => Self::Title,
            WishlistSort::Author => Self::Author,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum BookSort {
    Recent,
    Title,
    Author,
    Isbn,
}

impl From<BookSort> for CatalogOrder {
    fn from(sort: BookSort) -> Self {
        match sort {
            BookSort::Recent => Self::Recent,
            BookSort::Title => Self::Title,
            BookSort::Author => Self::Author,
            BookSort::Isbn => Self::Isbn,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
