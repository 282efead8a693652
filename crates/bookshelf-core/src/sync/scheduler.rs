//! Periodic driver for [`SyncEngine::sync`]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::SyncEngine;

/// Default cadence between background passes.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Runs a pass at start, on every tick, and whenever [`Self::trigger`] is called.
pub struct SyncScheduler {
    trigger: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn spawn(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        let trigger = Arc::new(Notify::new());
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let wake = trigger.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("Wishlist sync scheduler started ({:?} interval)", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = wake.notified() => {
                        tracing::debug!("Wishlist sync triggered on demand");
                    }
                    _ = shutdown_rx.changed() => break,
                }

                match engine.sync().await {
                    Ok(report) if report.skipped => {}
                    Ok(report) => tracing::debug!("Scheduled sync finished: {:?}", report.state),
                    Err(error) => tracing::error!("Scheduled sync failed: {}", error),
                }
            }

            tracing::info!("Wishlist sync scheduler stopped");
        });

        Self {
            trigger,
            shutdown,
            handle,
        }
    }

    /// Request a pass now, e.g. when connectivity returns.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Stop the loop, waiting for a running pass to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.handle.await {
            tracing::error!("Wishlist sync scheduler task failed: {}", error);
        }
    }
}
