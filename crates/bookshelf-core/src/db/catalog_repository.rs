//! Catalog repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use libsql::{params_from_iter, Connection, Row, Value};
use tokio::sync::Mutex;

use super::store::CatalogStore;
use super::values::{
    flag, integer, read_flag, read_i32, read_i64, read_required_i64, read_text, text,
};
use super::Database;
use crate::error::Result;
use crate::models::{normalize_isbn, BookDetails, CatalogEntry};

const SELECT_COLUMNS: &str = "SELECT local_id, remote_id, title, author, isbn, synopsis,
    cover_url, language, pages, publisher, edition, publication_year, category, location,
    read, rating, review, updated_at FROM catalog";

// SQL twin of `normalize_isbn`
const NORMALIZED_ISBN: &str = "UPPER(REPLACE(REPLACE(isbn, '-', ''), ' ', ''))";

/// libSQL access to the `catalog` table
pub struct LibSqlCatalogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlCatalogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn upsert(&self, entry: &CatalogEntry) -> Result<i64> {
        if let Some(remote_id) = entry.remote_id {
            let mut values = row_values(entry);
            values.push(Value::Integer(remote_id));
            let affected = self
                .conn
                .execute(
                    &format!("UPDATE catalog SET {ASSIGN_COLUMNS} WHERE remote_id = ?"),
                    params_from_iter(values),
                )
                .await?;
            if affected > 0 {
                return self.local_id_for_remote(remote_id).await;
            }
        }

        if let Some(local_id) = entry.local_id {
            let mut values = row_values(entry);
            values.push(Value::Integer(local_id));
            let affected = self
                .conn
                .execute(
                    &format!("UPDATE catalog SET {ASSIGN_COLUMNS} WHERE local_id = ?"),
                    params_from_iter(values),
                )
                .await?;
            if affected > 0 {
                return Ok(local_id);
            }
        }

        self.conn
            .execute(
                "INSERT INTO catalog (remote_id, title, author, isbn, synopsis, cover_url,
                    language, pages, publisher, edition, publication_year, category, location,
                    read, rating, review, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params_from_iter(row_values(entry)),
            )
            .await?;
        Ok(self.conn.last_insert_rowid())
    }

    pub async fn list(&self) -> Result<Vec<CatalogEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!("{SELECT_COLUMNS} ORDER BY updated_at DESC, local_id DESC"),
                (),
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(parse_entry(&row)?);
        }
        Ok(entries)
    }

    pub async fn get(&self, local_id: i64) -> Result<Option<CatalogEntry>> {
        let mut rows = self
            .conn
            .query(&format!("{SELECT_COLUMNS} WHERE local_id = ?"), [local_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_entry(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        let isbn = normalize_isbn(isbn);
        if isbn.is_empty() {
            return Ok(false);
        }
        let mut rows = self
            .conn
            .query(
                &format!("SELECT EXISTS(SELECT 1 FROM catalog WHERE {NORMALIZED_ISBN} = ?)"),
                [isbn],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? != 0),
            None => Ok(false),
        }
    }

    pub async fn isbns(&self) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT DISTINCT {NORMALIZED_ISBN} FROM catalog
                     WHERE isbn IS NOT NULL AND {NORMALIZED_ISBN} != '' ORDER BY 1"
                ),
                (),
            )
            .await?;
        let mut isbns = Vec::new();
        while let Some(row) = rows.next().await? {
            isbns.push(row.get::<String>(0)?);
        }
        Ok(isbns)
    }

    pub async fn replace_all(&self, entries: &[CatalogEntry]) -> Result<u64> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            self.conn.execute("DELETE FROM catalog", ()).await?;
            let mut written = 0;
            for entry in entries {
                let entry = CatalogEntry {
                    local_id: None,
                    ..entry.clone()
                };
                self.upsert(&entry).await?;
                written += 1;
            }
            Ok::<_, crate::Error>(written)
        }
        .await;

        match result {
            Ok(written) => {
                if let Err(e) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(written)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn local_id_for_remote(&self, remote_id: i64) -> Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT local_id FROM catalog WHERE remote_id = ?", [remote_id])
            .await?;
        match rows.next().await? {
            Some(row) => read_required_i64(&row, 0),
            None => Err(crate::Error::NotFound(format!("catalog book {remote_id}"))),
        }
    }
}

const ASSIGN_COLUMNS: &str = "remote_id = ?, title = ?, author = ?, isbn = ?, synopsis = ?,
    cover_url = ?, language = ?, pages = ?, publisher = ?, edition = ?, publication_year = ?,
    category = ?, location = ?, read = ?, rating = ?, review = ?, updated_at = ?";

fn row_values(entry: &CatalogEntry) -> Vec<Value> {
    let book = &entry.book;
    vec![
        integer(entry.remote_id),
        text(book.title.as_deref()),
        text(book.author.as_deref()),
        text(book.isbn.as_deref()),
        text(book.synopsis.as_deref()),
        text(book.cover_url.as_deref()),
        text(book.language.as_deref()),
        integer(book.pages.map(i64::from)),
        text(book.publisher.as_deref()),
        text(book.edition.as_deref()),
        text(book.publication_year.as_deref()),
        text(entry.category.as_deref()),
        text(entry.location.as_deref()),
        flag(entry.read),
        integer(entry.rating.map(i64::from)),
        text(entry.review.as_deref()),
        Value::Integer(entry.updated_at),
    ]
}

fn parse_entry(row: &Row) -> Result<CatalogEntry> {
    Ok(CatalogEntry {
        local_id: read_i64(row, 0)?,
        remote_id: read_i64(row, 1)?,
        book: BookDetails {
            title: read_text(row, 2)?,
            author: read_text(row, 3)?,
            isbn: read_text(row, 4)?,
            synopsis: read_text(row, 5)?,
            cover_url: read_text(row, 6)?,
            language: read_text(row, 7)?,
            pages: read_i32(row, 8)?,
            publisher: read_text(row, 9)?,
            edition: read_text(row, 10)?,
            publication_year: read_text(row, 11)?,
        },
        category: read_text(row, 12)?,
        location: read_text(row, 13)?,
        read: read_flag(row, 14)?,
        rating: read_i32(row, 15)?,
        review: read_text(row, 16)?,
        updated_at: read_required_i64(row, 17)?,
    })
}

/// [`CatalogStore`] over a shared libSQL database.
pub struct LibSqlCatalogStore {
    db: Arc<Mutex<Database>>,
}

impl LibSqlCatalogStore {
    pub const fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for LibSqlCatalogStore {
    async fn upsert(&self, entry: &CatalogEntry) -> Result<i64> {
        let db = self.db.lock().await;
        LibSqlCatalogRepository::new(db.connection())
            .upsert(entry)
            .await
    }

    async fn list(&self) -> Result<Vec<CatalogEntry>> {
        let db = self.db.lock().await;
        LibSqlCatalogRepository::new(db.connection()).list().await
    }

    async fn get(&self, local_id: i64) -> Result<Option<CatalogEntry>> {
        let db = self.db.lock().await;
        LibSqlCatalogRepository::new(db.connection())
            .get(local_id)
            .await
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlCatalogRepository::new(db.connection())
            .exists_by_isbn(isbn)
            .await
    }

    async fn isbns(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlCatalogRepository::new(db.connection()).isbns().await
    }

    async fn replace_all(&self, entries: &[CatalogEntry]) -> Result<u64> {
        let db = self.db.lock().await;
        let written = LibSqlCatalogRepository::new(db.connection())
            .replace_all(entries)
            .await?;
        tracing::debug!("Replaced catalog cache with {} books", written);
        Ok(written)
    }
}
