//! Wishlist model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::book::{contains_lowercase, BookDetails};

/// Store-assigned handle of a wishlist row.
///
/// Stable for as long as the row lives in the local store. It is never sent
/// to the server; the server identity lives in [`WishlistEntry::remote_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(i64);

impl LocalId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Content of a wished-for book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Bibliographic fields
    pub book: BookDetails,
    /// Free-text notes
    pub notes: Option<String>,
    /// Price the user is willing to pay
    pub desired_price: Option<f64>,
}

impl WishlistItem {
    pub const fn from_book(book: BookDetails) -> Self {
        Self {
            book,
            notes: None,
            desired_price: None,
        }
    }

    /// Case-insensitive match over title, author, ISBN, synopsis and notes.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.book.matches_lowercase(needle)
            || contains_lowercase(self.book.synopsis.as_deref(), needle)
            || contains_lowercase(self.notes.as_deref(), needle)
    }
}

/// A wishlist row as held by the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Local handle; `None` until the row is first written
    pub local_id: Option<LocalId>,
    /// Server-assigned identity; `None` until the server has confirmed the row
    pub remote_id: Option<i64>,
    /// Content fields
    pub item: WishlistItem,
    /// First local creation (Unix ms)
    pub created_at: i64,
    /// Last local mutation (Unix ms)
    pub updated_at: i64,
    /// Latest local mutation not yet confirmed by the server
    pub pending_sync: bool,
    /// Soft-deleted locally, deletion not yet confirmed by the server
    pub deleted: bool,
}

impl WishlistEntry {
    /// A brand-new entry that has never been stored or synced.
    pub fn new(item: WishlistItem) -> Self {
        let now = crate::util::now_millis();
        Self {
            local_id: None,
            remote_id: None,
            item,
            created_at: now,
            updated_at: now,
            pending_sync: true,
            deleted: false,
        }
    }

    /// Server identity, if it is a usable one.
    pub fn server_id(&self) -> Option<i64> {
        self.remote_id.filter(|id| *id > 0)
    }

    /// Whether the row reflects the server's last confirmed state.
    pub const fn is_confirmed(&self) -> bool {
        !self.pending_sync && !self.deleted
    }

    /// Normalized ISBN of the wished-for book.
    pub fn normalized_isbn(&self) -> Option<String> {
        self.item.book.normalized_isbn()
    }

    /// Title for messages, falling back to the ISBN.
    pub fn display_title(&self) -> String {
        self.item
            .book
            .title
            .clone()
            .or_else(|| self.item.book.isbn.clone())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_pending_and_unsynced() {
        let entry = WishlistEntry::new(WishlistItem::from_book(BookDetails::new(
            "Dune",
            "9780441013593",
        )));
        assert!(entry.pending_sync);
        assert!(!entry.deleted);
        assert_eq!(entry.local_id, None);
        assert_eq!(entry.server_id(), None);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn server_id_ignores_sentinel_values() {
        let mut entry = WishlistEntry::new(WishlistItem::default());
        entry.remote_id = Some(0);
        assert_eq!(entry.server_id(), None);
        entry.remote_id = Some(12);
        assert_eq!(entry.server_id(), Some(12));
    }

    #[test]
    fn local_id_parses_from_text() {
        assert_eq!(" 42 ".parse::<LocalId>().unwrap(), LocalId::new(42));
        assert!("abc".parse::<LocalId>().is_err());
    }

    #[test]
    fn item_matches_notes_and_synopsis() {
        let item = WishlistItem {
            book: BookDetails {
                synopsis: Some("Desert planet politics".to_string()),
                ..BookDetails::default()
            },
            notes: Some("Gift for Marta".to_string()),
            desired_price: None,
        };
        assert!(item.matches_lowercase("desert"));
        assert!(item.matches_lowercase("marta"));
        assert!(!item.matches_lowercase("ocean"));
    }
}
