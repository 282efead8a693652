//! Shared sync state types.

use std::fmt;

/// Reconciliation state exposed to hosts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No reconciliation pass has run yet.
    #[default]
    Idle,
    /// The last pass could not reach the server.
    Offline,
    /// A reconciliation pass is running.
    Syncing,
    /// The last pass pushed and pulled successfully.
    Synced,
    /// The last pass reached the server but was rejected.
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
