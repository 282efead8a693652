//! Catalog (owned books) model

use serde::{Deserialize, Serialize};

use super::book::BookDetails;

/// A book the user owns, with their personal reading state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Local row handle; `None` until stored
    pub local_id: Option<i64>,
    /// Server-assigned identity
    pub remote_id: Option<i64>,
    /// Bibliographic fields
    pub book: BookDetails,
    /// Shelf category
    pub category: Option<String>,
    /// Physical location
    pub location: Option<String>,
    /// Whether the user has read it
    pub read: bool,
    /// Personal rating
    pub rating: Option<i32>,
    /// Free-text review
    pub review: Option<String>,
    /// Last local write (Unix ms), drives "recent" ordering
    pub updated_at: i64,
}

impl CatalogEntry {
    pub fn from_book(book: BookDetails) -> Self {
        Self {
            book,
            updated_at: crate::util::now_millis(),
            ..Self::default()
        }
    }

    /// Normalized ISBN, or `None` when absent or blank.
    pub fn normalized_isbn(&self) -> Option<String> {
        self.book.normalized_isbn()
    }
}
