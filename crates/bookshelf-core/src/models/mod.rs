//! Data models for Bookshelf

mod book;
mod catalog;
mod isbn;
mod record;
mod settings;
mod wishlist;

pub use book::BookDetails;
pub use catalog::CatalogEntry;
pub use isbn::{normalize_isbn, validate_isbn, IsbnError};
pub use record::{CatalogRecord, WishlistRecord};
pub use settings::SyncSettings;
pub use wishlist::{LocalId, WishlistEntry, WishlistItem};
