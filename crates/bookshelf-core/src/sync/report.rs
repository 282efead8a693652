//! Outcome of a reconciliation pass

use crate::remote::RemoteError;
use crate::state::SyncState;

/// What happened to the pull phase of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PullOutcome {
    #[default]
    NotAttempted,
    /// The server snapshot was applied; `rows` server rows were written.
    Replaced { rows: u64 },
    /// The server could not be read; the local cache was left as it was.
    Failed { message: String },
}

/// Summary of one `sync()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Another pass was already running, nothing was done.
    pub skipped: bool,
    /// Rows the server confirmed during push.
    pub pushed: u64,
    /// Deletions the server confirmed during push.
    pub deleted: u64,
    /// Deleted rows the server never knew about, dropped locally.
    pub purged_local: u64,
    /// Failed batch calls during push.
    pub push_failures: u64,
    pub pull: PullOutcome,
    /// State the engine was left in.
    pub state: SyncState,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Push and pull both went through.
    pub fn is_complete(&self) -> bool {
        !self.skipped
            && self.push_failures == 0
            && matches!(self.pull, PullOutcome::Replaced { .. })
    }
}

/// Remote failures seen during a pass, folded into the resulting state.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FailureTally {
    transient: bool,
    rejected: bool,
}

impl FailureTally {
    pub(crate) fn record(&mut self, error: &RemoteError) {
        if error.is_transient() {
            self.transient = true;
        } else {
            self.rejected = true;
        }
    }

    pub(crate) const fn state(self) -> SyncState {
        if self.rejected {
            SyncState::Error
        } else if self.transient {
            SyncState::Offline
        } else {
            SyncState::Synced
        }
    }
}
