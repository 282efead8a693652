use std::io;

use bookshelf_core::models::IsbnError;
use bookshelf_core::remote::RemoteError;
use bookshelf_core::{CatalogError, PurchaseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bookshelf_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Purchase(#[from] PurchaseError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid ISBN '{input}': {source}")]
    InvalidIsbn { input: String, source: IsbnError },
    #[error("Wishlist id must be a number, got '{0}'")]
    InvalidLocalId(String),
    #[error("Nothing to add: pass at least --title or --isbn")]
    EmptyItem,
    #[error("No book found for ISBN {0}")]
    IsbnNotFound(String),
    #[error("Could not resolve a data directory; pass --db-path or set BOOKSHELF_DB_PATH")]
    NoDataDir,
}
