//! JSON records exchanged with the backend
//!
//! Field names follow the backend's schema. Timestamps arrive in several
//! shapes depending on the server build, so they are decoded leniently.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{BookDetails, CatalogEntry, WishlistEntry, WishlistItem};

/// Wishlist record as sent to and returned by `/wishlist` endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "titol")]
    pub title: Option<String>,
    #[serde(default, rename = "autor")]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default, rename = "sinopsis")]
    pub synopsis: Option<String>,
    #[serde(default, rename = "imatgeUrl")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "idioma")]
    pub language: Option<String>,
    #[serde(default, rename = "pagines")]
    pub pages: Option<i32>,
    #[serde(default, rename = "editorial")]
    pub publisher: Option<String>,
    #[serde(default, rename = "edicio")]
    pub edition: Option<String>,
    #[serde(
        default,
        rename = "anyPublicacio",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub publication_year: Option<String>,
    #[serde(default, rename = "preuDesitjat")]
    pub desired_price: Option<f64>,
    #[serde(
        default,
        rename = "updatedAt",
        deserialize_with = "deserialize_flexible_millis"
    )]
    pub updated_at: Option<i64>,
}

impl WishlistRecord {
    /// Outgoing record for a local row. Carries the server id only if known.
    pub fn from_entry(entry: &WishlistEntry) -> Self {
        let book = &entry.item.book;
        Self {
            id: entry.server_id(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            synopsis: book.synopsis.clone(),
            cover_url: book.cover_url.clone(),
            notes: entry.item.notes.clone(),
            language: book.language.clone(),
            pages: book.pages,
            publisher: book.publisher.clone(),
            edition: book.edition.clone(),
            publication_year: book.publication_year.clone(),
            desired_price: entry.item.desired_price,
            updated_at: Some(entry.updated_at),
        }
    }

    /// Server id, if it is a usable one.
    pub fn server_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    /// Convert a server record into a confirmed local row.
    ///
    /// Returns `None` for records without a usable server id; those must never
    /// reach the local store.
    pub fn into_confirmed_entry(self, created_at: i64, now: i64) -> Option<WishlistEntry> {
        let remote_id = self.server_id()?;
        let updated_at = self.updated_at.unwrap_or(now);
        Some(WishlistEntry {
            local_id: None,
            remote_id: Some(remote_id),
            item: WishlistItem {
                book: BookDetails {
                    title: self.title,
                    author: self.author,
                    isbn: self.isbn,
                    synopsis: self.synopsis,
                    cover_url: self.cover_url,
                    language: self.language,
                    pages: self.pages,
                    publisher: self.publisher,
                    edition: self.edition,
                    publication_year: self.publication_year,
                },
                notes: self.notes,
                desired_price: self.desired_price,
            },
            created_at,
            updated_at,
            pending_sync: false,
            deleted: false,
        })
    }
}

/// Catalog record as returned by `/llibres` and `/wishlist/purchase/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "titol")]
    pub title: Option<String>,
    #[serde(default, rename = "autor")]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default, rename = "editorial")]
    pub publisher: Option<String>,
    #[serde(default, rename = "edicio")]
    pub edition: Option<String>,
    #[serde(default, rename = "sinopsis")]
    pub synopsis: Option<String>,
    #[serde(default, rename = "pagines")]
    pub pages: Option<i32>,
    #[serde(default, rename = "imatgeUrl")]
    pub cover_url: Option<String>,
    #[serde(
        default,
        rename = "anyPublicacio",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub publication_year: Option<String>,
    #[serde(default, rename = "idioma")]
    pub language: Option<String>,
    #[serde(default, rename = "categoria")]
    pub category: Option<String>,
    #[serde(default, rename = "ubicacio")]
    pub location: Option<String>,
    #[serde(default, rename = "llegit")]
    pub read: Option<bool>,
    #[serde(default, rename = "comentari")]
    pub review: Option<String>,
    #[serde(default, rename = "puntuacio")]
    pub rating: Option<i32>,
    #[serde(
        default,
        rename = "updatedAt",
        deserialize_with = "deserialize_flexible_millis"
    )]
    pub updated_at: Option<i64>,
}

impl CatalogRecord {
    pub fn into_entry(self, now: i64) -> CatalogEntry {
        CatalogEntry {
            local_id: None,
            remote_id: self.id.filter(|id| *id > 0),
            book: BookDetails {
                title: self.title,
                author: self.author,
                isbn: self.isbn,
                synopsis: self.synopsis,
                cover_url: self.cover_url,
                language: self.language,
                pages: self.pages,
                publisher: self.publisher,
                edition: self.edition,
                publication_year: self.publication_year,
            },
            category: self.category,
            location: self.location,
            read: self.read.unwrap_or(false),
            rating: self.rating,
            review: self.review,
            updated_at: now,
        }
    }
}

/// Accept a timestamp as a JSON number, a numeric string, or ISO-8601 text.
///
/// ISO-8601 without an offset is read as UTC. Anything else decodes as `None`.
fn deserialize_flexible_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_flexible_millis))
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_flexible_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(millis) = text.parse::<i64>() {
                return Some(millis);
            }
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.timestamp_millis());
            }
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc().timestamp_millis())
        }
        _ => None,
    }
}

fn deserialize_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => crate::util::normalize_text_option(Some(text)),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
