//! Persisted per-database settings model

use serde::{Deserialize, Serialize};

/// Settings kept next to the local cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Last successful wishlist pull (Unix ms)
    pub last_sync_at: Option<i64>,
}

impl SyncSettings {
    /// Whether a pull has ever completed against this database.
    pub const fn has_synced(&self) -> bool {
        self.last_sync_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = SyncSettings::default();
        assert!(!settings.has_synced());
    }
}
