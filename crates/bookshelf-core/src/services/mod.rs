//! Higher-level services composed from the store and remote layers

mod catalog;
mod database;

pub use catalog::{CatalogError, CatalogResult, CatalogService};
pub use database::DatabaseService;
