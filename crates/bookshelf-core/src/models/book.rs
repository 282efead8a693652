//! Bibliographic fields shared by wishlist and catalog entries

use serde::{Deserialize, Serialize};

use super::isbn::normalize_isbn;

/// Descriptive metadata of a book. Every field is optional: a partially
/// known book is still a valid entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub synopsis: Option<String>,
    pub cover_url: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i32>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub publication_year: Option<String>,
}

impl BookDetails {
    /// Book with just a title and ISBN, the minimum a scan or form produces.
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            isbn: Some(isbn.into()),
            ..Self::default()
        }
    }

    /// Normalized ISBN, or `None` when absent or blank.
    pub fn normalized_isbn(&self) -> Option<String> {
        self.isbn
            .as_deref()
            .map(normalize_isbn)
            .filter(|isbn| !isbn.is_empty())
    }

    /// Fill the fields still unset in `self` from `fetched`.
    ///
    /// A page count of zero or less counts as unset.
    #[must_use]
    pub fn merge_prefer_local(self, fetched: Self) -> Self {
        Self {
            title: self.title.or(fetched.title),
            author: self.author.or(fetched.author),
            isbn: self.isbn.or(fetched.isbn),
            synopsis: self.synopsis.or(fetched.synopsis),
            cover_url: self.cover_url.or(fetched.cover_url),
            language: self.language.or(fetched.language),
            pages: self.pages.filter(|pages| *pages > 0).or(fetched.pages),
            publisher: self.publisher.or(fetched.publisher),
            edition: self.edition.or(fetched.edition),
            publication_year: self.publication_year.or(fetched.publication_year),
        }
    }

    /// Case-insensitive substring match against title, author and ISBN.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.title, &self.author, &self.isbn]
            .into_iter()
            .any(|field| contains_lowercase(field.as_deref(), needle))
    }
}

pub(crate) fn contains_lowercase(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_local_fields() {
        let local = BookDetails {
            title: Some("Dune (my copy)".to_string()),
            pages: Some(0),
            ..BookDetails::default()
        };
        let fetched = BookDetails {
            title: Some("Dune".to_string()),
            author: Some("Frank Herbert".to_string()),
            pages: Some(604),
            ..BookDetails::default()
        };

        let merged = local.merge_prefer_local(fetched);
        assert_eq!(merged.title.as_deref(), Some("Dune (my copy)"));
        assert_eq!(merged.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(merged.pages, Some(604));
    }

    #[test]
    fn normalized_isbn_ignores_blank() {
        let book = BookDetails {
            isbn: Some(" - ".to_string()),
            ..BookDetails::default()
        };
        assert_eq!(book.normalized_isbn(), None);
        assert_eq!(
            BookDetails::new("Dune", "978-0441013593").normalized_isbn(),
            Some("9780441013593".to_string())
        );
    }
}
