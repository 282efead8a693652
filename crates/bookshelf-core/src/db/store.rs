//! Local store seams consumed by the sync engine and catalog service

use async_trait::async_trait;
use tokio::sync::watch;

use super::wishlist_repository::RowStamp;
use crate::error::Result;
use crate::models::{CatalogEntry, LocalId, SyncSettings, WishlistEntry};

/// Durable wishlist cache.
///
/// Every mutating call publishes a fresh snapshot to [`WishlistStore::observe_all`]
/// subscribers once it has completed.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Insert (no local id) or replace (local id present). Returns the row's local id.
    async fn upsert(&self, entry: &WishlistEntry) -> Result<LocalId>;

    /// Upsert several rows in one transaction.
    async fn upsert_all(&self, entries: &[WishlistEntry]) -> Result<Vec<LocalId>>;

    /// Soft-delete a row and mark it pending. Returns false if it does not exist.
    async fn mark_deleted(&self, id: LocalId, at: i64) -> Result<bool>;

    /// Clear the pending flag of rows whose stamp is unchanged.
    async fn mark_synced(&self, stamps: &[RowStamp]) -> Result<u64>;

    /// Rows with an unconfirmed mutation, including pending deletions.
    async fn get_pending_sync(&self) -> Result<Vec<WishlistEntry>>;

    async fn get_by_id(&self, id: LocalId) -> Result<Option<WishlistEntry>>;

    /// Hard delete. Returns false if the row did not exist.
    async fn delete_by_id(&self, id: LocalId) -> Result<bool>;

    async fn clear_all(&self) -> Result<()>;

    /// Mirror a server snapshot without touching pending rows.
    async fn replace_all(&self, entries: &[WishlistEntry]) -> Result<u64>;

    /// Swap in the server's version of a row if it was not modified since
    /// `expected_updated_at`. Returns whether the row was confirmed.
    async fn confirm(
        &self,
        id: LocalId,
        expected_updated_at: i64,
        canonical: &WishlistEntry,
    ) -> Result<bool>;

    /// Remove rows carrying a zero or negative remote id.
    async fn purge_invalid_remote_ids(&self) -> Result<u64>;

    /// Soft-deleted rows hidden from the active list.
    async fn list_pending_deletions(&self) -> Result<Vec<WishlistEntry>>;

    /// Active rows, most recently modified first, updated after every mutation.
    fn observe_all(&self) -> watch::Receiver<Vec<WishlistEntry>>;

    async fn load_sync_settings(&self) -> Result<SyncSettings>;

    async fn save_sync_settings(&self, settings: &SyncSettings) -> Result<()>;
}

/// Local copy of the owned-books catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or update, matching on remote id first and local id second.
    async fn upsert(&self, entry: &CatalogEntry) -> Result<i64>;

    /// All entries, most recently updated first.
    async fn list(&self) -> Result<Vec<CatalogEntry>>;

    async fn get(&self, local_id: i64) -> Result<Option<CatalogEntry>>;

    /// Whether a book with this ISBN is owned, comparing normalized forms.
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool>;

    /// Normalized ISBNs of all owned books.
    async fn isbns(&self) -> Result<Vec<String>>;

    /// Replace the whole catalog in one transaction.
    async fn replace_all(&self, entries: &[CatalogEntry]) -> Result<u64>;
}
