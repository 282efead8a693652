//! Shared database service wrapper used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlCatalogStore, LibSqlWishlistStore, WishlistStore};
use crate::models::SyncSettings;
use crate::Result;

/// Owns the local database and the stores built on top of it.
#[derive(Clone)]
pub struct DatabaseService {
    db_path: Option<PathBuf>,
    wishlist: Arc<LibSqlWishlistStore>,
    catalog: Arc<LibSqlCatalogStore>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and replaced by a fresh
    /// cache; the server copy is repopulated on the next sync.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local cache at {} is unreadable ({}); starting a fresh one",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Self::from_database(db, Some(db_path)).await
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Self::from_database(db, None).await
    }

    async fn from_database(db: Database, db_path: Option<PathBuf>) -> Result<Self> {
        let db = Arc::new(Mutex::new(db));
        let wishlist = Arc::new(LibSqlWishlistStore::new(db.clone()).await?);
        let catalog = Arc::new(LibSqlCatalogStore::new(db));
        Ok(Self {
            db_path,
            wishlist,
            catalog,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn wishlist_store(&self) -> Arc<LibSqlWishlistStore> {
        self.wishlist.clone()
    }

    pub fn catalog_store(&self) -> Arc<LibSqlCatalogStore> {
        self.catalog.clone()
    }

    /// Load persisted sync settings.
    pub async fn load_sync_settings(&self) -> Result<SyncSettings> {
        self.wishlist.load_sync_settings().await
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .map_or_else(|| "bookshelf.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale local DB file {}", path.display());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogStore;
    use crate::models::{BookDetails, CatalogEntry, WishlistEntry, WishlistItem};

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_stores_share_one_database() {
        let service = DatabaseService::open_in_memory().await.unwrap();

        service
            .wishlist_store()
            .upsert(&WishlistEntry::new(WishlistItem::default()))
            .await
            .unwrap();
        service
            .catalog_store()
            .upsert(&CatalogEntry::from_book(BookDetails::new("Dune", "1")))
            .await
            .unwrap();

        assert_eq!(service.wishlist_store().observe_all().borrow().len(), 1);
        assert_eq!(service.catalog_store().list().await.unwrap().len(), 1);
        assert_eq!(service.db_path(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("bookshelf.db");

        let service = DatabaseService::open_path(&db_path).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(service.db_path(), Some(db_path.as_path()));
        assert_eq!(service.load_sync_settings().await.unwrap(), SyncSettings::default());
    }

    #[test]
    fn detects_corrupted_db_errors() {
        assert!(DatabaseService::is_corrupted_db_error(&crate::Error::Database(
            "SQLite failure: file is not a database".to_string()
        )));
        assert!(!DatabaseService::is_corrupted_db_error(
            &crate::Error::InvalidInput("an ISBN is required".to_string())
        ));
    }

    #[test]
    fn quarantine_moves_db_and_removes_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("bookshelf.db");
        let wal_path = tmp.path().join("bookshelf.db-wal");
        let shm_path = tmp.path().join("bookshelf.db-shm");

        std::fs::write(&db_path, b"bad-db").unwrap();
        std::fs::write(&wal_path, b"wal").unwrap();
        std::fs::write(&shm_path, b"shm").unwrap();

        DatabaseService::quarantine_corrupted_db_files(&db_path).unwrap();

        assert!(!db_path.exists());
        assert!(!wal_path.exists());
        assert!(!shm_path.exists());

        let found_backup = std::fs::read_dir(tmp.path()).unwrap().any(|entry| {
            entry
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("bookshelf.db.corrupt-")
        });
        assert!(found_backup);
    }
}
