//! Catalog cache refresh and ISBN metadata lookup.

use std::sync::Arc;

use thiserror::Error;

use crate::db::CatalogStore;
use crate::models::{normalize_isbn, BookDetails, CatalogEntry};
use crate::remote::{BookRemote, RemoteError};
use crate::search::{filter_catalog, CatalogOrder};
use crate::util::now_millis;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] crate::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Owned-books cache backed by the `/llibres` endpoints.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    remote: Arc<dyn BookRemote>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, remote: Arc<dyn BookRemote>) -> Self {
        Self { store, remote }
    }

    /// Replace the local catalog with the server's. A failed fetch keeps the
    /// stale catalog.
    pub async fn refresh(&self) -> CatalogResult<u64> {
        let records = match self.remote.list_books().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!("Catalog refresh failed, keeping local copy: {}", error);
                return Err(error.into());
            }
        };

        let now = now_millis();
        let entries: Vec<CatalogEntry> = records
            .into_iter()
            .map(|record| record.into_entry(now))
            .collect();
        let written = self.store.replace_all(&entries).await?;
        tracing::info!("Catalog refreshed with {} books", written);
        Ok(written)
    }

    /// Cached books matching `query`, in the requested order.
    pub async fn list(&self, query: &str, order: CatalogOrder) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries = self.store.list().await?;
        if query.trim().is_empty() {
            crate::search::sort_catalog(&mut entries, order);
            return Ok(entries);
        }
        Ok(filter_catalog(&entries, query, order))
    }

    /// Whether a book with this ISBN is already owned.
    pub async fn owns_isbn(&self, isbn: &str) -> CatalogResult<bool> {
        Ok(self.store.exists_by_isbn(isbn).await?)
    }

    /// Persist a book returned by a purchase.
    pub async fn record_purchase(&self, entry: &CatalogEntry) -> CatalogResult<i64> {
        Ok(self.store.upsert(entry).await?)
    }

    /// Fetch metadata for an ISBN. `Ok(None)` when the backend has none.
    pub async fn lookup_isbn(&self, isbn: &str) -> CatalogResult<Option<BookDetails>> {
        let isbn = normalize_isbn(isbn);
        if isbn.is_empty() {
            return Err(crate::Error::InvalidInput("an ISBN is required".to_string()).into());
        }

        let record = self.remote.fetch_by_isbn(&isbn).await?;
        Ok(record.map(|record| record.into_entry(now_millis()).book))
    }

    /// Fill blanks in `local` from a lookup of its ISBN.
    ///
    /// Returns `local` unchanged when it has no ISBN or the lookup finds nothing.
    pub async fn enrich(&self, local: BookDetails) -> CatalogResult<BookDetails> {
        let Some(isbn) = local.normalized_isbn() else {
            return Ok(local);
        };
        match self.lookup_isbn(&isbn).await? {
            Some(fetched) => Ok(Self::merge_prefer_local(local, fetched)),
            None => Ok(local),
        }
    }

    /// Keep every field the user set, taking the rest from `fetched`.
    pub fn merge_prefer_local(local: BookDetails, fetched: BookDetails) -> BookDetails {
        local.merge_prefer_local(fetched)
    }
}
