//! Offline-first wishlist sync engine

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex, RwLock};

use super::notice::Notice;
use super::report::{FailureTally, PullOutcome, SyncReport};
use crate::db::{CatalogStore, RowStamp, WishlistStore};
use crate::error::{Error, Result};
use crate::models::{BookDetails, CatalogEntry, LocalId, WishlistEntry, WishlistItem, WishlistRecord};
use crate::remote::{RemoteError, WishlistRemote};
use crate::state::SyncState;
use crate::util::now_millis;

const NOTICE_CAPACITY: usize = 32;

/// Why a purchase was refused or did not go through.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("A book with ISBN {isbn} is already in the library")]
    AlreadyInLibrary { isbn: String },
    #[error("Wishlist item {0} not found")]
    NotFound(LocalId),
    #[error("Wishlist item {0} has not reached the server yet; sync first")]
    NotSynced(LocalId),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] Error),
}

/// Result of [`SyncEngine::add_from_book`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedBook {
    pub local_id: LocalId,
    /// The same ISBN is already in the catalog.
    pub already_owned: bool,
}

/// Keeps the local wishlist cache and the backend converging.
///
/// Writes land in the local store first and are confirmed by the server
/// when it is reachable. Remote failures never escape `add_or_update`,
/// `delete` or `sync`; they leave rows pending and surface as notices.
///
/// Remote writes and their local confirmation run under a shared gate that
/// a sync pass holds exclusively, so a pass never mirrors a server snapshot
/// over a confirmation it did not see, nor pushes a row another call is
/// still sending.
pub struct SyncEngine {
    store: Arc<dyn WishlistStore>,
    catalog: Arc<dyn CatalogStore>,
    remote: Arc<dyn WishlistRemote>,
    state: watch::Sender<SyncState>,
    notices: broadcast::Sender<Notice>,
    sync_guard: Mutex<()>,
    write_gate: RwLock<()>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn WishlistStore>,
        catalog: Arc<dyn CatalogStore>,
        remote: Arc<dyn WishlistRemote>,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            store,
            catalog,
            remote,
            state,
            notices,
            sync_guard: Mutex::new(()),
            write_gate: RwLock::new(()),
        }
    }

    /// Live view of active wishlist rows, most recent first.
    pub fn observe_all(&self) -> watch::Receiver<Vec<WishlistEntry>> {
        self.store.observe_all()
    }

    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Last successful pull (unix ms).
    pub async fn last_sync_at(&self) -> Result<Option<i64>> {
        Ok(self.store.load_sync_settings().await?.last_sync_at)
    }

    /// Write an entry locally, then try to get it confirmed by the server.
    ///
    /// The row is visible through [`Self::observe_all`] before any network
    /// call is made. A remote failure leaves it pending for the next pass.
    pub async fn add_or_update(&self, mut entry: WishlistEntry) -> Result<LocalId> {
        let stored = match entry.local_id {
            Some(id) => self.store.get_by_id(id).await?,
            None => None,
        };
        // Server identity only ever comes from a server response
        entry.remote_id = stored.as_ref().and_then(|row| row.remote_id);
        if let Some(row) = &stored {
            entry.created_at = row.created_at;
        }
        entry.updated_at = now_millis();
        entry.pending_sync = true;
        entry.deleted = false;

        let local_id = self.store.upsert(&entry).await?;
        let written_at = entry.updated_at;

        let _gate = self.write_gate.read().await;
        // A sync pass or a later write may have settled the row meanwhile
        let entry = match self.store.get_by_id(local_id).await? {
            Some(row) if row.pending_sync && !row.deleted && row.updated_at == written_at => row,
            _ => {
                tracing::debug!("Wishlist row {} already settled; skipping upsert", local_id);
                return Ok(local_id);
            }
        };
        let title = entry.display_title();

        match self.remote.upsert(&WishlistRecord::from_entry(&entry)).await {
            Ok(saved) => match saved.into_confirmed_entry(entry.created_at, now_millis()) {
                Some(canonical) => {
                    if self
                        .store
                        .confirm(local_id, entry.updated_at, &canonical)
                        .await?
                    {
                        tracing::debug!(
                            "Wishlist row {} confirmed as remote {:?}",
                            local_id,
                            canonical.remote_id
                        );
                        self.notify(Notice::success(format!("Saved \"{title}\"")));
                    }
                }
                None => {
                    tracing::warn!(
                        "Server stored wishlist row {} without a usable id; keeping it pending",
                        local_id
                    );
                    self.notify(Notice::warning(format!(
                        "\"{title}\" saved locally; it will sync later"
                    )));
                }
            },
            Err(error) => {
                tracing::warn!(
                    "Wishlist upsert failed, row {} stays pending: {}",
                    local_id,
                    error
                );
                self.notify(Notice::warning(format!(
                    "\"{title}\" saved offline; it will sync later"
                )));
            }
        }

        Ok(local_id)
    }

    /// Add a scanned or looked-up book, refusing duplicates within the wishlist.
    pub async fn add_from_book(&self, mut item: WishlistItem) -> Result<AddedBook> {
        let isbn = item
            .book
            .normalized_isbn()
            .ok_or_else(|| Error::InvalidInput("an ISBN is required".to_string()))?;

        let duplicate = {
            let observer = self.store.observe_all();
            let rows = observer.borrow();
            rows.iter()
                .any(|row| row.normalized_isbn().as_deref() == Some(isbn.as_str()))
        };
        if duplicate {
            self.notify(Notice::warning(format!("ISBN {isbn} is already in the wishlist")));
            return Err(Error::AlreadyExists(format!(
                "ISBN {isbn} is already in the wishlist"
            )));
        }

        let already_owned = self.catalog.exists_by_isbn(&isbn).await?;
        item.book = BookDetails {
            isbn: Some(isbn.clone()),
            ..item.book
        };
        item.notes = crate::util::normalize_text_option(item.notes);

        let local_id = self.add_or_update(WishlistEntry::new(item)).await?;
        if already_owned {
            self.notify(Notice::info(format!(
                "ISBN {isbn} is already in your library"
            )));
        }
        Ok(AddedBook {
            local_id,
            already_owned,
        })
    }

    /// Delete on the server, or remember the deletion for the next pass.
    pub async fn delete(&self, id: LocalId) -> Result<()> {
        let _gate = self.write_gate.read().await;
        let row = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("wishlist item {id}")))?;
        let title = row.display_title();

        let Some(remote_id) = row.server_id() else {
            self.store.delete_by_id(id).await?;
            self.notify(Notice::success(format!("Removed \"{title}\"")));
            return Ok(());
        };

        match self.remote.delete(remote_id).await {
            Ok(()) => {
                self.store.delete_by_id(id).await?;
                self.notify(Notice::success(format!("Removed \"{title}\"")));
            }
            Err(error) => {
                tracing::warn!(
                    "Wishlist delete of remote {} failed, keeping it pending: {}",
                    remote_id,
                    error
                );
                self.store.mark_deleted(id, now_millis()).await?;
                self.notify(Notice::warning(format!(
                    "\"{title}\" removed offline; it will sync later"
                )));
            }
        }
        Ok(())
    }

    /// Push pending rows, then mirror the server's wishlist.
    ///
    /// Returns a skipped report if another pass is already running. Only
    /// local store failures are returned as errors.
    pub async fn sync(&self) -> Result<SyncReport> {
        let Ok(_guard) = self.sync_guard.try_lock() else {
            tracing::debug!("Wishlist sync already running; skipping");
            return Ok(SyncReport::skipped());
        };

        self.state.send_replace(SyncState::Syncing);
        let _writes = self.write_gate.write().await;
        let mut report = SyncReport::default();
        let mut tally = FailureTally::default();

        let result = async {
            self.push(&mut report, &mut tally).await?;
            self.pull(&mut report, &mut tally).await
        }
        .await;

        if let Err(error) = result {
            tracing::error!("Wishlist sync aborted by local store failure: {}", error);
            self.state.send_replace(SyncState::Error);
            self.notify(Notice::warning("Sync failed: local storage error"));
            return Err(error);
        }

        report.state = tally.state();
        self.state.send_replace(report.state);
        if report.is_complete() {
            tracing::info!(
                "Wishlist sync complete: {} pushed, {} deleted",
                report.pushed,
                report.deleted
            );
            self.notify(Notice::success("Wishlist synced"));
        } else {
            self.notify(Notice::warning(
                "Wishlist sync incomplete; pending changes will be retried",
            ));
        }
        Ok(report)
    }

    async fn push(&self, report: &mut SyncReport, tally: &mut FailureTally) -> Result<()> {
        let pending = self.store.get_pending_sync().await?;
        if pending.is_empty() {
            return Ok(());
        }

        let (deleted, to_upsert): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|row| row.deleted);

        let mut to_delete = Vec::new();
        for row in deleted {
            let Some(stamp) = RowStamp::of(&row) else {
                continue;
            };
            match row.server_id() {
                Some(remote_id) => to_delete.push((stamp, remote_id)),
                None => {
                    // never reached the server
                    if self.store.delete_by_id(stamp.local_id).await? {
                        report.purged_local += 1;
                    }
                }
            }
        }

        if !to_upsert.is_empty() {
            self.push_upserts(&to_upsert, report, tally).await?;
        }

        if !to_delete.is_empty() {
            let ids: Vec<i64> = to_delete.iter().map(|(_, remote_id)| *remote_id).collect();
            match self.remote.delete_many(&ids).await {
                Ok(()) => {
                    let stamps: Vec<RowStamp> = to_delete.iter().map(|(stamp, _)| *stamp).collect();
                    report.deleted += self.store.mark_synced(&stamps).await?;
                }
                Err(error) => {
                    tracing::warn!("Wishlist deleteMany failed for {} ids: {}", ids.len(), error);
                    tally.record(&error);
                    report.push_failures += 1;
                }
            }
        }

        tracing::info!(
            "Wishlist push finished: {} confirmed, {} deleted, {} failed calls",
            report.pushed,
            report.deleted,
            report.push_failures
        );
        Ok(())
    }

    async fn push_upserts(
        &self,
        rows: &[WishlistEntry],
        report: &mut SyncReport,
        tally: &mut FailureTally,
    ) -> Result<()> {
        let records: Vec<WishlistRecord> = rows.iter().map(WishlistRecord::from_entry).collect();
        let saved = match self.remote.upsert_all(&records).await {
            Ok(saved) => saved,
            Err(error) => {
                tracing::warn!("Wishlist upsertAll failed for {} rows: {}", rows.len(), error);
                tally.record(&error);
                report.push_failures += 1;
                return Ok(());
            }
        };

        if saved.len() != rows.len() {
            tracing::warn!(
                "upsertAll returned {} records for {} rows; relying on pull to reconcile",
                saved.len(),
                rows.len()
            );
            let stamps: Vec<RowStamp> = rows.iter().filter_map(RowStamp::of).collect();
            report.pushed += self.store.mark_synced(&stamps).await?;
            return Ok(());
        }

        let now = now_millis();
        for (row, record) in rows.iter().zip(saved) {
            let Some(stamp) = RowStamp::of(row) else {
                continue;
            };
            match record.into_confirmed_entry(row.created_at, now) {
                Some(canonical) => {
                    if self
                        .store
                        .confirm(stamp.local_id, stamp.updated_at, &canonical)
                        .await?
                    {
                        report.pushed += 1;
                    }
                }
                None => tracing::warn!(
                    "Server returned no usable id for wishlist row {}; keeping it pending",
                    stamp.local_id
                ),
            }
        }
        Ok(())
    }

    async fn pull(&self, report: &mut SyncReport, tally: &mut FailureTally) -> Result<()> {
        let records = match self.remote.get_all().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!("Wishlist pull failed, keeping local snapshot: {}", error);
                tally.record(&error);
                report.pull = PullOutcome::Failed {
                    message: error.to_string(),
                };
                return Ok(());
            }
        };

        let now = now_millis();
        let received = records.len();
        let entries: Vec<WishlistEntry> = records
            .into_iter()
            .filter_map(|record| record.into_confirmed_entry(now, now))
            .collect();
        if entries.len() < received {
            tracing::warn!(
                "Ignored {} server wishlist records without a usable id",
                received - entries.len()
            );
        }

        let rows = self.store.replace_all(&entries).await?;
        self.store.purge_invalid_remote_ids().await?;

        let mut settings = self.store.load_sync_settings().await?;
        settings.last_sync_at = Some(now);
        self.store.save_sync_settings(&settings).await?;

        tracing::info!("Wishlist pull applied {} server rows", rows);
        report.pull = PullOutcome::Replaced { rows };
        Ok(())
    }

    /// Turn a wishlist item into an owned book on the server.
    ///
    /// Refused without any remote call when the ISBN is already in the
    /// catalog. Not optimistic: on failure the wishlist row is left untouched.
    /// The returned entry is not stored in the catalog cache.
    pub async fn purchase(&self, id: LocalId) -> std::result::Result<CatalogEntry, PurchaseError> {
        let _gate = self.write_gate.read().await;
        let row = self
            .store
            .get_by_id(id)
            .await?
            .filter(|row| !row.deleted)
            .ok_or(PurchaseError::NotFound(id))?;
        let title = row.display_title();

        if let Some(isbn) = row.normalized_isbn() {
            if self.catalog.exists_by_isbn(&isbn).await? {
                self.notify(Notice::warning(format!(
                    "\"{title}\" is already in your library"
                )));
                return Err(PurchaseError::AlreadyInLibrary { isbn });
            }
        }

        let remote_id = row.server_id().ok_or(PurchaseError::NotSynced(id))?;

        match self.remote.purchase(remote_id).await {
            Ok(record) => {
                self.store.delete_by_id(id).await?;
                tracing::info!("Purchased wishlist row {} (remote {})", id, remote_id);
                self.notify(Notice::success(format!("\"{title}\" moved to your library")));
                Ok(record.into_entry(now_millis()))
            }
            Err(error) => {
                tracing::warn!("Purchase of remote {} failed: {}", remote_id, error);
                self.notify(Notice::warning(format!("Could not purchase \"{title}\"")));
                Err(PurchaseError::Remote(error))
            }
        }
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }
}
