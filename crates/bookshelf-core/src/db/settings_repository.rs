//! Settings repository implementation

use crate::error::Result;
use crate::models::SyncSettings;
use libsql::Connection;

const LAST_SYNC_AT_KEY: &str = "wishlist.last_sync_at";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<SyncSettings>;

    /// Save settings to the database
    async fn save(&self, settings: &SyncSettings) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<SyncSettings> {
        let mut settings = SyncSettings::default();

        if let Some(value) = self.get_setting(LAST_SYNC_AT_KEY).await? {
            settings.last_sync_at = value.trim().parse().ok();
        }

        Ok(settings)
    }

    async fn save(&self, settings: &SyncSettings) -> Result<()> {
        match settings.last_sync_at {
            Some(at) => self.set_setting(LAST_SYNC_AT_KEY, &at.to_string()).await,
            None => self.remove_setting(LAST_SYNC_AT_KEY).await,
        }
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn remove_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_default_settings() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let settings = repo.load().await.unwrap();
        assert_eq!(settings.last_sync_at, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_clear_last_sync() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        repo.save(&SyncSettings {
            last_sync_at: Some(1_757_725_213_000),
        })
        .await
        .unwrap();
        assert_eq!(repo.load().await.unwrap().last_sync_at, Some(1_757_725_213_000));

        repo.save(&SyncSettings::default()).await.unwrap();
        assert_eq!(repo.load().await.unwrap().last_sync_at, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unparseable_value_is_ignored() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.set_setting(LAST_SYNC_AT_KEY, "soon").await.unwrap();

        assert_eq!(repo.load().await.unwrap(), SyncSettings::default());
    }
}
