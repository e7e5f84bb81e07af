//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed settings store implementation
///
/// The desktop stand-in for browser localStorage: one row per key, surviving
/// restarts of the host application. The schema is created on first use, so a
/// store can be constructed outside of an async runtime with [`open_lazy`].
///
/// [`open_lazy`]: SqliteSettingsStore::open_lazy
pub struct SqliteSettingsStore {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
    schema: OnceCell<()>,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::open_lazy(db_path);
        store.ready().await?;
        debug!(path = ?store.db_path, "Initialized settings store");
        Ok(store)
    }

    /// Create a store without touching the filesystem.
    ///
    /// The parent directory, database file and table are created by the first
    /// operation.
    pub fn open_lazy(db_path: impl AsRef<Path>) -> Self {
        let db_path = db_path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = Self::pool_options().connect_lazy_with(options);

        Self {
            pool,
            db_path: Some(db_path),
            schema: OnceCell::new(),
        }
    }

    /// Open the store at the platform data directory
    /// (`<data_local_dir>/angel-event/session.db`).
    pub async fn open_default() -> Result<Self> {
        Self::new(Self::default_path()?).await
    }

    /// Default database location for the current user
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join("angel-event").join("session.db"))
            .ok_or_else(|| {
                BridgeError::NotAvailable("No local data directory for this user".to_string())
            })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // Every connection to `:memory:` is its own database, so pin the pool to one
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid DB options: {}", e)))?;
        let pool = Self::pool_options()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        let store = Self {
            pool,
            db_path: None,
            schema: OnceCell::new(),
        };
        store.ready().await?;
        Ok(store)
    }

    /// Connections are never reaped; this also keeps the pool from spawning
    /// maintenance tasks, so it can be built outside a runtime.
    fn pool_options() -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .idle_timeout(None)
            .max_lifetime(None)
    }

    async fn ready(&self) -> Result<&SqlitePool> {
        self.schema
            .get_or_try_init(|| async {
                if let Some(parent) = self.db_path.as_deref().and_then(Path::parent) {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(BridgeError::Io)?;
                    }
                }

                sqlx::query(CREATE_TABLE)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        BridgeError::OperationFailed(format!("Failed to create table: {}", e))
                    })?;
                Ok::<(), BridgeError>(())
            })
            .await?;

        Ok(&self.pool)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default()
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(self.ready().await?)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to set setting: {}", e)))?;

        // Values can be credentials; only the key is logged
        debug!(key = key, "Stored setting");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.ready().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to get setting: {}", e)))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(self.ready().await?)
            .await
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to delete setting: {}", e))
            })?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.ready().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(self.ready().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to list keys: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(self.ready().await?)
            .await
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to clear settings: {}", e))
            })?;

        debug!("Cleared all settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("auth_token", "abc123").await.unwrap();
        assert_eq!(
            store.get_string("auth_token").await.unwrap(),
            Some("abc123".to_string())
        );
        assert!(store.has_key("auth_token").await.unwrap());

        store.delete("auth_token").await.unwrap();
        assert_eq!(store.get_string("auth_token").await.unwrap(), None);
        assert!(!store.has_key("auth_token").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("auth_token", "first").await.unwrap();
        store.set_string("auth_token", "second").await.unwrap();

        assert_eq!(
            store.get_string("auth_token").await.unwrap(),
            Some("second".to_string())
        );
        assert_eq!(store.list_keys().await.unwrap(), vec!["auth_token"]);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        assert!(store.delete("never_written").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("key2", "value2").await.unwrap();
        store.set_string("key1", "value1").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["key1", "key2"]);

        store.clear_all().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
