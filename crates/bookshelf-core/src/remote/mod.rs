//! Remote service seams and the HTTP client implementing them

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CatalogRecord, WishlistRecord};

pub use http::HttpRemote;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),
    #[error("Remote API error: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl RemoteError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => !error.is_decode() && !error.is_builder(),
            Self::Unavailable(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::InvalidConfiguration(_) | Self::InvalidPayload(_) => false,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Wishlist endpoints of the backend.
#[async_trait]
pub trait WishlistRemote: Send + Sync {
    async fn get_all(&self) -> RemoteResult<Vec<WishlistRecord>>;

    /// Store one record; the server assigns an id when `record.id` is absent.
    async fn upsert(&self, record: &WishlistRecord) -> RemoteResult<WishlistRecord>;

    async fn upsert_all(&self, records: &[WishlistRecord]) -> RemoteResult<Vec<WishlistRecord>>;

    async fn delete(&self, id: i64) -> RemoteResult<()>;

    async fn delete_many(&self, ids: &[i64]) -> RemoteResult<()>;

    /// Convert a wishlist item into an owned book, returning the new book.
    async fn purchase(&self, id: i64) -> RemoteResult<CatalogRecord>;
}

/// Catalog endpoints of the backend.
#[async_trait]
pub trait BookRemote: Send + Sync {
    async fn list_books(&self) -> RemoteResult<Vec<CatalogRecord>>;

    /// Metadata lookup by ISBN; `None` when the backend knows no such book.
    async fn fetch_by_isbn(&self, isbn: &str) -> RemoteResult<Option<CatalogRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let error = RemoteError::Api {
            status: 503,
            message: "down".to_string(),
        };
        assert!(error.is_transient());
        assert!(RemoteError::Api {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(RemoteError::Unavailable("offline".to_string()).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!RemoteError::Api {
            status: 409,
            message: "conflict".to_string()
        }
        .is_transient());
        assert!(!RemoteError::InvalidPayload("bad".to_string()).is_transient());
    }
}
