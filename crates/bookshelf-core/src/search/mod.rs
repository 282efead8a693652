//! In-memory filtering and ordering of wishlist and catalog lists

use std::cmp::Ordering;

use crate::models::{CatalogEntry, WishlistEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WishlistOrder {
    Title,
    Author,
    /// Newest first, by creation time
    #[default]
    Recent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogOrder {
    /// Most recently updated first
    #[default]
    Recent,
    Title,
    Author,
    Isbn,
}

/// Case-insensitive substring filter over title, author, ISBN, synopsis and
/// notes, followed by the requested ordering.
///
/// A blank query keeps every entry.
pub fn filter_wishlist(
    entries: &[WishlistEntry],
    query: &str,
    order: WishlistOrder,
) -> Vec<WishlistEntry> {
    let needle = query.trim().to_lowercase();
    let mut matched: Vec<WishlistEntry> = entries
        .iter()
        .filter(|entry| needle.is_empty() || entry.item.matches_lowercase(&needle))
        .cloned()
        .collect();

    match order {
        WishlistOrder::Title => matched.sort_by(|a, b| {
            compare_text(a.item.book.title.as_deref(), b.item.book.title.as_deref())
        }),
        WishlistOrder::Author => matched.sort_by(|a, b| {
            compare_text(a.item.book.author.as_deref(), b.item.book.author.as_deref())
        }),
        WishlistOrder::Recent => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    matched
}

/// Case-insensitive substring filter over title, author and ISBN, followed
/// by the requested ordering.
///
/// A blank query returns the input order unchanged.
pub fn filter_catalog(entries: &[CatalogEntry], query: &str, order: CatalogOrder) -> Vec<CatalogEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.to_vec();
    }

    let mut matched: Vec<CatalogEntry> = entries
        .iter()
        .filter(|entry| entry.book.matches_lowercase(&needle))
        .cloned()
        .collect();
    sort_catalog(&mut matched, order);
    matched
}

pub fn sort_catalog(entries: &mut [CatalogEntry], order: CatalogOrder) {
    match order {
        CatalogOrder::Recent => entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        CatalogOrder::Title => {
            entries.sort_by(|a, b| compare_text(a.book.title.as_deref(), b.book.title.as_deref()));
        }
        CatalogOrder::Author => entries
            .sort_by(|a, b| compare_text(a.book.author.as_deref(), b.book.author.as_deref())),
        CatalogOrder::Isbn => entries.sort_by(|a, b| {
            compare_text(
                a.normalized_isbn().as_deref(),
                b.normalized_isbn().as_deref(),
            )
        }),
    }
}

/// Case-insensitive comparison with missing or blank values last.
fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.map(str::trim).filter(|value| !value.is_empty());
    let b = b.map(str::trim).filter(|value| !value.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookDetails, WishlistItem};

    fn wish(title: Option<&str>, author: &str, created_at: i64) -> WishlistEntry {
        let mut entry = WishlistEntry::new(WishlistItem::from_book(BookDetails {
            title: title.map(str::to_string),
            author: Some(author.to_string()),
            ..BookDetails::default()
        }));
        entry.created_at = created_at;
        entry
    }

    fn titles(entries: &[WishlistEntry]) -> Vec<Option<&str>> {
        entries
            .iter()
            .map(|entry| entry.item.book.title.as_deref())
            .collect()
    }

    #[test]
    fn wishlist_orders_by_title_with_missing_last() {
        let entries = vec![
            wish(None, "Anon", 1),
            wish(Some("dune"), "Herbert", 2),
            wish(Some("Children of Time"), "Tchaikovsky", 3),
        ];
        let sorted = filter_wishlist(&entries, "", WishlistOrder::Title);
        assert_eq!(titles(&sorted), vec![Some("Children of Time"), Some("dune"), None]);
    }

    #[test]
    fn wishlist_recent_uses_creation_time() {
        let entries = vec![wish(Some("Old"), "A", 1), wish(Some("New"), "B", 5)];
        let sorted = filter_wishlist(&entries, "  ", WishlistOrder::Recent);
        assert_eq!(titles(&sorted), vec![Some("New"), Some("Old")]);
    }

    #[test]
    fn wishlist_query_matches_author_case_insensitively() {
        let entries = vec![wish(Some("Dune"), "Frank Herbert", 1), wish(Some("Emma"), "Austen", 2)];
        let found = filter_wishlist(&entries, "HERB", WishlistOrder::Recent);
        assert_eq!(titles(&found), vec![Some("Dune")]);
    }

    #[test]
    fn catalog_blank_query_keeps_input_order() {
        let entries = vec![
            CatalogEntry::from_book(BookDetails::new("B", "2")),
            CatalogEntry::from_book(BookDetails::new("A", "1")),
        ];
        let result = filter_catalog(&entries, "", CatalogOrder::Title);
        assert_eq!(result, entries);
    }

    #[test]
    fn catalog_sorts_by_isbn() {
        let mut entries = vec![
            CatalogEntry::from_book(BookDetails::new("B", "978-2")),
            CatalogEntry::from_book(BookDetails::new("A", "978-1")),
        ];
        sort_catalog(&mut entries, CatalogOrder::Isbn);
        assert_eq!(entries[0].book.title.as_deref(), Some("A"));

        let found = filter_catalog(&entries, "9781", CatalogOrder::Recent);
        assert!(found.is_empty());
        let found = filter_catalog(&entries, "978-1", CatalogOrder::Recent);
        assert_eq!(found.len(), 1);
    }
}
