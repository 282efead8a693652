//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    debug_assert!(get_version(conn).await? <= CURRENT_VERSION);
    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: wishlist cache, catalog cache and settings
async fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Wishlist cache; remote_id stays NULL until the server confirms a row
        "CREATE TABLE IF NOT EXISTS wishlist (
            local_id INTEGER PRIMARY KEY AUTOINCREMENT,
            remote_id INTEGER UNIQUE,
            title TEXT,
            author TEXT,
            isbn TEXT,
            synopsis TEXT,
            cover_url TEXT,
            notes TEXT,
            language TEXT,
            pages INTEGER,
            publisher TEXT,
            edition TEXT,
            publication_year TEXT,
            desired_price REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            pending_sync INTEGER NOT NULL DEFAULT 1,
            deleted INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_wishlist_updated ON wishlist(updated_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_wishlist_pending ON wishlist(pending_sync)",
        // Catalog cache, written from server responses only
        "CREATE TABLE IF NOT EXISTS catalog (
            local_id INTEGER PRIMARY KEY AUTOINCREMENT,
            remote_id INTEGER UNIQUE,
            title TEXT,
            author TEXT,
            isbn TEXT,
            synopsis TEXT,
            cover_url TEXT,
            language TEXT,
            pages INTEGER,
            publisher TEXT,
            edition TEXT,
            publication_year TEXT,
            category TEXT,
            location TEXT,
            read INTEGER NOT NULL DEFAULT 0,
            rating INTEGER,
            review TEXT,
            updated_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_catalog_isbn ON catalog(isbn)",
        "CREATE INDEX IF NOT EXISTS idx_catalog_updated ON catalog(updated_at DESC)",
        // Settings table (local only)
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version 1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn raw_connection() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_are_idempotent() {
        let conn = raw_connection().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_tables_exist_after_migration() {
        let conn = raw_connection().await;
        run(&conn).await.unwrap();

        for table in ["wishlist", "catalog", "settings"] {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
                    [table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            assert_eq!(row.get::<i64>(0).unwrap(), 1, "missing table {table}");
        }
    }
}
