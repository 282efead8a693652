//! Database layer for Bookshelf

mod catalog_repository;
mod connection;
mod migrations;
mod settings_repository;
mod store;
mod values;
mod wishlist_repository;
mod wishlist_store;

pub use catalog_repository::{LibSqlCatalogRepository, LibSqlCatalogStore};
pub use connection::Database;
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
pub use store::{CatalogStore, WishlistStore};
pub use wishlist_repository::{LibSqlWishlistRepository, RowStamp};
pub use wishlist_store::LibSqlWishlistStore;
