//! libSQL-backed wishlist store with snapshot publishing

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use super::settings_repository::{LibSqlSettingsRepository, SettingsRepository};
use super::store::WishlistStore;
use super::wishlist_repository::{LibSqlWishlistRepository, RowStamp};
use super::Database;
use crate::error::Result;
use crate::models::{LocalId, SyncSettings, WishlistEntry};

/// [`WishlistStore`] over a shared libSQL database.
pub struct LibSqlWishlistStore {
    db: Arc<Mutex<Database>>,
    snapshot: watch::Sender<Vec<WishlistEntry>>,
}

impl LibSqlWishlistStore {
    /// Wrap a database and load the initial snapshot.
    pub async fn new(db: Arc<Mutex<Database>>) -> Result<Self> {
        let initial = {
            let guard = db.lock().await;
            LibSqlWishlistRepository::new(guard.connection())
                .list_active()
                .await?
        };
        let (snapshot, _) = watch::channel(initial);
        Ok(Self { db, snapshot })
    }

    /// Re-read active rows and notify subscribers if anything changed.
    async fn publish(&self, repo: &LibSqlWishlistRepository<'_>) -> Result<()> {
        let rows = repo.list_active().await?;
        self.snapshot.send_if_modified(|current| {
            if *current == rows {
                false
            } else {
                *current = rows;
                true
            }
        });
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for LibSqlWishlistStore {
    async fn upsert(&self, entry: &WishlistEntry) -> Result<LocalId> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let id = repo.upsert(entry).await?;
        tracing::debug!("Stored wishlist row {}", id);
        self.publish(&repo).await?;
        Ok(id)
    }

    async fn upsert_all(&self, entries: &[WishlistEntry]) -> Result<Vec<LocalId>> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let ids = repo.upsert_all(entries).await?;
        self.publish(&repo).await?;
        Ok(ids)
    }

    async fn mark_deleted(&self, id: LocalId, at: i64) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let found = repo.mark_deleted(id, at).await?;
        self.publish(&repo).await?;
        Ok(found)
    }

    async fn mark_synced(&self, stamps: &[RowStamp]) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let cleared = repo.mark_synced(stamps).await?;
        self.publish(&repo).await?;
        Ok(cleared)
    }

    async fn get_pending_sync(&self) -> Result<Vec<WishlistEntry>> {
        let db = self.db.lock().await;
        LibSqlWishlistRepository::new(db.connection())
            .list_pending()
            .await
    }

    async fn get_by_id(&self, id: LocalId) -> Result<Option<WishlistEntry>> {
        let db = self.db.lock().await;
        LibSqlWishlistRepository::new(db.connection()).get(id).await
    }

    async fn delete_by_id(&self, id: LocalId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let removed = repo.delete(id).await?;
        if removed {
            tracing::debug!("Purged wishlist row {}", id);
        }
        self.publish(&repo).await?;
        Ok(removed)
    }

    async fn clear_all(&self) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        repo.clear().await?;
        self.publish(&repo).await
    }

    async fn replace_all(&self, entries: &[WishlistEntry]) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let written = repo.replace_all(entries).await?;
        tracing::debug!("Replaced wishlist cache with {} server rows", written);
        self.publish(&repo).await?;
        Ok(written)
    }

    async fn confirm(
        &self,
        id: LocalId,
        expected_updated_at: i64,
        canonical: &WishlistEntry,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let confirmed = repo.confirm(id, expected_updated_at, canonical).await?;
        self.publish(&repo).await?;
        Ok(confirmed)
    }

    async fn purge_invalid_remote_ids(&self) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlWishlistRepository::new(db.connection());
        let removed = repo.purge_invalid_remote_ids().await?;
        if removed > 0 {
            tracing::warn!("Removed {} wishlist rows with invalid server ids", removed);
            self.publish(&repo).await?;
        }
        Ok(removed)
    }

    async fn list_pending_deletions(&self) -> Result<Vec<WishlistEntry>> {
        let db = self.db.lock().await;
        LibSqlWishlistRepository::new(db.connection())
            .list_pending_deletions()
            .await
    }

    fn observe_all(&self) -> watch::Receiver<Vec<WishlistEntry>> {
        self.snapshot.subscribe()
    }

    async fn load_sync_settings(&self) -> Result<SyncSettings> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection()).load().await
    }

    async fn save_sync_settings(&self, settings: &SyncSettings) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection())
            .save(settings)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookDetails, WishlistItem};

    async fn setup() -> LibSqlWishlistStore {
        let db = Database::open_in_memory().await.unwrap();
        LibSqlWishlistStore::new(Arc::new(Mutex::new(db)))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_observer_sees_writes() {
        let store = setup().await;
        let mut observer = store.observe_all();
        assert!(observer.borrow_and_update().is_empty());

        let entry = WishlistEntry::new(WishlistItem::from_book(BookDetails::new(
            "Dune",
            "9780441013593",
        )));
        let id = store.upsert(&entry).await.unwrap();

        assert!(observer.has_changed().unwrap());
        let rows = observer.borrow_and_update().clone();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].local_id, Some(id));

        store.mark_deleted(id, crate::util::now_millis()).await.unwrap();
        assert!(observer.borrow_and_update().is_empty());
        assert_eq!(store.list_pending_deletions().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_new_subscriber_gets_current_snapshot() {
        let store = setup().await;
        store
            .upsert(&WishlistEntry::new(WishlistItem::default()))
            .await
            .unwrap();

        let observer = store.observe_all();
        assert_eq!(observer.borrow().len(), 1);
    }

    fn wish(title: &str) -> WishlistEntry {
        WishlistEntry::new(WishlistItem::from_book(BookDetails {
            title: Some(title.to_string()),
            ..BookDetails::default()
        }))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_all_writes_batch_and_publishes_once() {
        let store = setup().await;
        let observer = store.observe_all();

        let ids = store
            .upsert_all(&[wish("Dune"), wish("Emma")])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(observer.borrow().len(), 2);
        assert_eq!(store.get_pending_sync().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_all_rolls_back_on_failure() {
        let store = setup().await;
        let mut confirmed = wish("Dune");
        confirmed.remote_id = Some(5);
        confirmed.pending_sync = false;
        store.upsert(&confirmed).await.unwrap();

        let mut clash = wish("Dune again");
        clash.remote_id = Some(5);
        let result = store.upsert_all(&[wish("Emma"), clash]).await;

        assert!(result.is_err());
        let rows = store.observe_all().borrow().clone();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item.book.title.as_deref(), Some("Dune"));
        assert!(store.get_pending_sync().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clear_all_empties_store() {
        let store = setup().await;
        let id = store.upsert(&wish("Dune")).await.unwrap();
        store.upsert(&wish("Emma")).await.unwrap();
        store.mark_deleted(id, crate::util::now_millis()).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.observe_all().borrow().is_empty());
        assert!(store.list_pending_deletions().await.unwrap().is_empty());
        assert!(store.get_pending_sync().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_settings_roundtrip() {
        let store = setup().await;
        assert_eq!(store.load_sync_settings().await.unwrap(), SyncSettings::default());

        let settings = SyncSettings {
            last_sync_at: Some(1_700_000_000_000),
        };
        store.save_sync_settings(&settings).await.unwrap();
        assert_eq!(store.load_sync_settings().await.unwrap(), settings);
    }
}
