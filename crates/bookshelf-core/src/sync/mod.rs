//! Wishlist synchronization: engine, reports, notices and the periodic driver

mod engine;
#[cfg(test)]
mod fake;
mod notice;
mod report;
mod scheduler;

pub use engine::{AddedBook, PurchaseError, SyncEngine};
pub use notice::{Notice, NoticeLevel};
pub use report::{PullOutcome, SyncReport};
pub use scheduler::{SyncScheduler, DEFAULT_SYNC_INTERVAL};
