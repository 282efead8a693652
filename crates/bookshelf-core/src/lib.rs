//! bookshelf-core - Core library for Bookshelf
//!
//! This crate contains the shared models, local cache, backend client and the
//! offline-first wishlist sync engine used by Bookshelf hosts.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod search;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{BookDetails, CatalogEntry, LocalId, WishlistEntry, WishlistItem};
pub use services::{CatalogError, CatalogService, DatabaseService};
pub use state::SyncState;
pub use sync::{Notice, PurchaseError, SyncEngine, SyncReport, SyncScheduler};
