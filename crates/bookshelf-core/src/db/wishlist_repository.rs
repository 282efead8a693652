//! Wishlist repository implementation

use std::collections::HashSet;

use libsql::{params_from_iter, Connection, Row, Value};

use super::values::{
    flag, integer, read_f64, read_flag, read_i32, read_i64, read_required_i64, read_text, real,
    text,
};
use crate::error::Result;
use crate::models::{BookDetails, LocalId, WishlistEntry, WishlistItem};

const SELECT_COLUMNS: &str = "SELECT local_id, remote_id, title, author, isbn, synopsis, cover_url,
    notes, language, pages, publisher, edition, publication_year, desired_price,
    created_at, updated_at, pending_sync, deleted FROM wishlist";

const INSERT_COLUMNS: &str = "remote_id, title, author, isbn, synopsis, cover_url, notes,
    language, pages, publisher, edition, publication_year, desired_price,
    created_at, updated_at, pending_sync, deleted";

const ASSIGN_COLUMNS: &str = "remote_id = ?, title = ?, author = ?, isbn = ?, synopsis = ?,
    cover_url = ?, notes = ?, language = ?, pages = ?, publisher = ?, edition = ?,
    publication_year = ?, desired_price = ?, created_at = ?, updated_at = ?,
    pending_sync = ?, deleted = ?";

/// Identity and stamp of a row as seen when it was read for pushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStamp {
    pub local_id: LocalId,
    pub updated_at: i64,
}

impl RowStamp {
    /// Stamp of a stored entry; `None` for entries that were never written.
    pub fn of(entry: &WishlistEntry) -> Option<Self> {
        entry.local_id.map(|local_id| Self {
            local_id,
            updated_at: entry.updated_at,
        })
    }
}

/// libSQL access to the `wishlist` table
pub struct LibSqlWishlistRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlWishlistRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert when the entry has no local id, otherwise replace that row.
    pub async fn upsert(&self, entry: &WishlistEntry) -> Result<LocalId> {
        let Some(local_id) = entry.local_id else {
            return self.insert(entry).await;
        };

        if self.update_row(local_id, entry).await? == 0 {
            let mut values = vec![Value::Integer(local_id.get())];
            values.extend(row_values(entry));
            self.conn
                .execute(
                    &format!(
                        "INSERT INTO wishlist (local_id, {INSERT_COLUMNS})
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                    ),
                    params_from_iter(values),
                )
                .await?;
        }
        Ok(local_id)
    }

    /// Upsert several rows as one unit.
    pub async fn upsert_all(&self, entries: &[WishlistEntry]) -> Result<Vec<LocalId>> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.upsert(entry).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e);
                }
            }
        }
        self.commit().await?;
        Ok(ids)
    }

    /// Get a row by local id, including soft-deleted rows.
    pub async fn get(&self, local_id: LocalId) -> Result<Option<WishlistEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!("{SELECT_COLUMNS} WHERE local_id = ?"),
                [local_id.get()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// Rows visible to users, most recently modified first.
    pub async fn list_active(&self) -> Result<Vec<WishlistEntry>> {
        self.collect(&format!(
            "{SELECT_COLUMNS} WHERE deleted = 0 ORDER BY updated_at DESC, local_id DESC"
        ))
        .await
    }

    /// Soft-deleted rows waiting for the server to confirm the deletion.
    pub async fn list_pending_deletions(&self) -> Result<Vec<WishlistEntry>> {
        self.collect(&format!(
            "{SELECT_COLUMNS} WHERE deleted = 1 ORDER BY updated_at DESC, local_id DESC"
        ))
        .await
    }

    /// Every row with an unconfirmed mutation, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<WishlistEntry>> {
        self.collect(&format!(
            "{SELECT_COLUMNS} WHERE pending_sync = 1 ORDER BY updated_at ASC, local_id ASC"
        ))
        .await
    }

    /// Flag a row as deleted and pending. Returns false if the row is gone.
    pub async fn mark_deleted(&self, local_id: LocalId, at: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "UPDATE wishlist SET deleted = 1, pending_sync = 1, updated_at = ? WHERE local_id = ?",
                [at, local_id.get()],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Clear the pending flag of rows not modified since they were stamped.
    pub async fn mark_synced(&self, stamps: &[RowStamp]) -> Result<u64> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let mut cleared = 0;
        for stamp in stamps {
            match self
                .conn
                .execute(
                    "UPDATE wishlist SET pending_sync = 0 WHERE local_id = ? AND updated_at = ?",
                    [stamp.local_id.get(), stamp.updated_at],
                )
                .await
            {
                Ok(affected) => cleared += affected,
                Err(e) => {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
            }
        }
        self.commit().await?;
        Ok(cleared)
    }

    /// Hard delete. Returns false if the row did not exist.
    pub async fn delete(&self, local_id: LocalId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM wishlist WHERE local_id = ?", [local_id.get()])
            .await?;
        Ok(affected > 0)
    }

    pub async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM wishlist", ()).await?;
        Ok(())
    }

    /// Replace a row with the server's version if it still carries `expected_updated_at`.
    ///
    /// Any other row already holding the canonical remote id is dropped. When
    /// the row was modified in the meantime it stays pending, but a missing
    /// remote id is still recorded so the next push updates instead of
    /// creating a duplicate.
    pub async fn confirm(
        &self,
        local_id: LocalId,
        expected_updated_at: i64,
        canonical: &WishlistEntry,
    ) -> Result<bool> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        match self
            .confirm_inner(local_id, expected_updated_at, canonical)
            .await
        {
            Ok(confirmed) => {
                self.commit().await?;
                Ok(confirmed)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn confirm_inner(
        &self,
        local_id: LocalId,
        expected_updated_at: i64,
        canonical: &WishlistEntry,
    ) -> Result<bool> {
        let Some(current) = self.get(local_id).await? else {
            return Ok(false);
        };
        let remote_id = canonical.server_id();

        if let Some(remote_id) = remote_id {
            self.conn
                .execute(
                    "DELETE FROM wishlist WHERE remote_id = ? AND local_id != ?",
                    [remote_id, local_id.get()],
                )
                .await?;
        }

        if current.updated_at != expected_updated_at {
            if let (None, Some(remote_id)) = (current.server_id(), remote_id) {
                self.conn
                    .execute(
                        "UPDATE wishlist SET remote_id = ? WHERE local_id = ?",
                        [remote_id, local_id.get()],
                    )
                    .await?;
            }
            tracing::debug!(
                "Skipped confirm of wishlist row {}: modified since push",
                local_id
            );
            return Ok(false);
        }

        let confirmed = WishlistEntry {
            local_id: Some(local_id),
            remote_id,
            created_at: current.created_at,
            pending_sync: false,
            deleted: false,
            ..canonical.clone()
        };
        self.update_row(local_id, &confirmed).await?;
        Ok(true)
    }

    /// Mirror a server snapshot, leaving pending rows untouched.
    ///
    /// Confirmed rows are matched on remote id and keep their local id.
    /// Confirmed rows missing from the snapshot are removed. Entries without
    /// a usable remote id are ignored.
    pub async fn replace_all(&self, entries: &[WishlistEntry]) -> Result<u64> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        match self.replace_all_inner(entries).await {
            Ok(written) => {
                self.commit().await?;
                Ok(written)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn replace_all_inner(&self, entries: &[WishlistEntry]) -> Result<u64> {
        let incoming: HashSet<i64> = entries.iter().filter_map(WishlistEntry::server_id).collect();

        let mut pending_remote_ids = HashSet::new();
        let mut stale = Vec::new();
        let mut rows = self
            .conn
            .query("SELECT local_id, remote_id, pending_sync FROM wishlist", ())
            .await?;
        while let Some(row) = rows.next().await? {
            let local_id = read_required_i64(&row, 0)?;
            let remote_id = read_i64(&row, 1)?;
            if read_flag(&row, 2)? {
                pending_remote_ids.extend(remote_id);
            } else if !remote_id.is_some_and(|id| incoming.contains(&id)) {
                stale.push(local_id);
            }
        }
        drop(rows);

        for local_id in stale {
            self.conn
                .execute("DELETE FROM wishlist WHERE local_id = ?", [local_id])
                .await?;
        }

        let mut written = 0;
        for entry in entries {
            let Some(remote_id) = entry.server_id() else {
                continue;
            };
            if pending_remote_ids.contains(&remote_id) {
                continue;
            }
            let row = WishlistEntry {
                local_id: None,
                remote_id: Some(remote_id),
                pending_sync: false,
                deleted: false,
                ..entry.clone()
            };
            if self.update_by_remote_id(remote_id, &row).await? == 0 {
                self.insert(&row).await?;
            }
            written += 1;
        }
        Ok(written)
    }

    /// Remove rows carrying a zero or negative remote id.
    pub async fn purge_invalid_remote_ids(&self) -> Result<u64> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM wishlist WHERE remote_id IS NOT NULL AND remote_id <= 0",
                (),
            )
            .await?;
        Ok(removed)
    }

    async fn insert(&self, entry: &WishlistEntry) -> Result<LocalId> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO wishlist ({INSERT_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params_from_iter(row_values(entry)),
            )
            .await?;
        Ok(LocalId::new(self.conn.last_insert_rowid()))
    }

    async fn update_row(&self, local_id: LocalId, entry: &WishlistEntry) -> Result<u64> {
        let mut values = row_values(entry);
        values.push(Value::Integer(local_id.get()));
        let affected = self
            .conn
            .execute(
                &format!("UPDATE wishlist SET {ASSIGN_COLUMNS} WHERE local_id = ?"),
                params_from_iter(values),
            )
            .await?;
        Ok(affected)
    }

    /// Update a confirmed row in place, keeping its local creation time.
    async fn update_by_remote_id(&self, remote_id: i64, entry: &WishlistEntry) -> Result<u64> {
        let mut values = row_values(entry);
        // created_at is the 14th value
        values.remove(13);
        values.push(Value::Integer(remote_id));
        let affected = self
            .conn
            .execute(
                "UPDATE wishlist SET remote_id = ?, title = ?, author = ?, isbn = ?,
                    synopsis = ?, cover_url = ?, notes = ?, language = ?, pages = ?,
                    publisher = ?, edition = ?, publication_year = ?, desired_price = ?,
                    updated_at = ?, pending_sync = ?, deleted = ?
                 WHERE remote_id = ? AND pending_sync = 0",
                params_from_iter(values),
            )
            .await?;
        Ok(affected)
    }

    async fn collect(&self, sql: &str) -> Result<Vec<WishlistEntry>> {
        let mut rows = self.conn.query(sql, ()).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(parse_entry(&row)?);
        }
        Ok(entries)
    }

    async fn commit(&self) -> Result<()> {
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}

fn row_values(entry: &WishlistEntry) -> Vec<Value> {
    let book = &entry.item.book;
    vec![
        integer(entry.remote_id),
        text(book.title.as_deref()),
        text(book.author.as_deref()),
        text(book.isbn.as_deref()),
        text(book.synopsis.as_deref()),
        text(book.cover_url.as_deref()),
        text(entry.item.notes.as_deref()),
        text(book.language.as_deref()),
        integer(book.pages.map(i64::from)),
        text(book.publisher.as_deref()),
        text(book.edition.as_deref()),
        text(book.publication_year.as_deref()),
        real(entry.item.desired_price),
        Value::Integer(entry.created_at),
        Value::Integer(entry.updated_at),
        flag(entry.pending_sync),
        flag(entry.deleted),
    ]
}

fn parse_entry(row: &Row) -> Result<WishlistEntry> {
    Ok(WishlistEntry {
        local_id: Some(LocalId::new(read_required_i64(row, 0)?)),
        remote_id: read_i64(row, 1)?,
        item: WishlistItem {
            book: BookDetails {
                title: read_text(row, 2)?,
                author: read_text(row, 3)?,
                isbn: read_text(row, 4)?,
                synopsis: read_text(row, 5)?,
                cover_url: read_text(row, 6)?,
                language: read_text(row, 8)?,
                pages: read_i32(row, 9)?,
                publisher: read_text(row, 10)?,
                edition: read_text(row, 11)?,
                publication_year: read_text(row, 12)?,
            },
            notes: read_text(row, 7)?,
            desired_price: read_f64(row, 13)?,
        },
        created_at: read_required_i64(row, 14)?,
        updated_at: read_required_i64(row, 15)?,
        pending_sync: read_flag(row, 16)?,
        deleted: read_flag(row, 17)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn pending(title: &str, isbn: &str) -> WishlistEntry {
        WishlistEntry::new(WishlistItem::from_book(BookDetails::new(title, isbn)))
    }

    fn confirmed(remote_id: i64, title: &str) -> WishlistEntry {
        WishlistEntry {
            remote_id: Some(remote_id),
            pending_sync: false,
            ..pending(title, "")
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_inserts_then_replaces() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        let mut entry = pending("Dune", "9780441013593");
        let id = repo.upsert(&entry).await.unwrap();

        entry.local_id = Some(id);
        entry.item.notes = Some("hardcover".to_string());
        assert_eq!(repo.upsert(&entry).await.unwrap(), id);

        let stored = repo.get(id).await.unwrap().unwrap();
        assert_eq!(stored, entry);
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_deleted_hides_row() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        let id = repo.upsert(&pending("Dune", "1")).await.unwrap();
        assert!(repo.mark_deleted(id, crate::util::now_millis()).await.unwrap());

        assert!(repo.list_active().await.unwrap().is_empty());
        let hidden = repo.list_pending_deletions().await.unwrap();
        assert_eq!(hidden.len(), 1);
        assert!(hidden[0].deleted && hidden[0].pending_sync);
        assert!(!repo.mark_deleted(LocalId::new(999), 1).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_confirm_requires_unchanged_stamp() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        let entry = pending("Dune", "1");
        let id = repo.upsert(&entry).await.unwrap();
        let canonical = WishlistEntry {
            remote_id: Some(41),
            ..entry.clone()
        };

        assert!(!repo.confirm(id, entry.updated_at - 1, &canonical).await.unwrap());
        let stale = repo.get(id).await.unwrap().unwrap();
        assert!(stale.pending_sync);
        assert_eq!(stale.remote_id, Some(41));

        assert!(repo.confirm(id, entry.updated_at, &canonical).await.unwrap());
        let stored = repo.get(id).await.unwrap().unwrap();
        assert!(!stored.pending_sync);
        assert_eq!(stored.remote_id, Some(41));
        assert_eq!(stored.created_at, entry.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_confirm_drops_duplicate_remote_row() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        repo.upsert(&confirmed(5, "Dune")).await.unwrap();
        let entry = pending("Dune", "1");
        let id = repo.upsert(&entry).await.unwrap();

        let canonical = WishlistEntry {
            remote_id: Some(5),
            ..entry.clone()
        };
        assert!(repo.confirm(id, entry.updated_at, &canonical).await.unwrap());

        let rows = repo.list_active().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].local_id, Some(id));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replace_all_preserves_pending_rows() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        let kept = repo.upsert(&confirmed(1, "Old title")).await.unwrap();
        repo.upsert(&confirmed(2, "Gone on server")).await.unwrap();
        let local_only = repo.upsert(&pending("Offline add", "9")).await.unwrap();
        let mut edited = confirmed(3, "Edited offline");
        edited.pending_sync = true;
        repo.upsert(&edited).await.unwrap();

        let snapshot = vec![
            confirmed(1, "New title"),
            confirmed(3, "Server copy"),
            confirmed(4, "Added elsewhere"),
            confirmed(0, "Sentinel"),
        ];
        assert_eq!(repo.replace_all(&snapshot).await.unwrap(), 2);

        let rows = repo.list_active().await.unwrap();
        let titles: HashSet<_> = rows
            .iter()
            .filter_map(|row| row.item.book.title.clone())
            .collect();
        assert_eq!(
            titles,
            HashSet::from([
                "New title".to_string(),
                "Offline add".to_string(),
                "Edited offline".to_string(),
                "Added elsewhere".to_string(),
            ])
        );
        assert_eq!(
            repo.get(kept).await.unwrap().unwrap().item.book.title.as_deref(),
            Some("New title")
        );
        assert!(repo.get(local_only).await.unwrap().unwrap().pending_sync);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_synced_skips_modified_rows() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        let first = repo.upsert(&pending("A", "1")).await.unwrap();
        let second = repo.upsert(&pending("B", "2")).await.unwrap();
        let snapshot = repo.list_pending().await.unwrap();
        let stamps: Vec<_> = snapshot.iter().filter_map(RowStamp::of).collect();

        repo.mark_deleted(second, crate::util::now_millis()).await.unwrap();
        assert_eq!(repo.mark_synced(&stamps).await.unwrap(), 1);

        assert!(!repo.get(first).await.unwrap().unwrap().pending_sync);
        assert!(repo.get(second).await.unwrap().unwrap().pending_sync);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_purge_invalid_remote_ids() {
        let db = setup().await;
        let repo = LibSqlWishlistRepository::new(db.connection());

        repo.upsert(&confirmed(0, "Ghost")).await.unwrap();
        repo.upsert(&confirmed(-1, "Ghost too")).await.unwrap();
        repo.upsert(&confirmed(8, "Real")).await.unwrap();
        repo.upsert(&pending("Local", "1")).await.unwrap();

        assert_eq!(repo.purge_invalid_remote_ids().await.unwrap(), 2);
        assert_eq!(repo.list_active().await.unwrap().len(), 2);
    }
}
