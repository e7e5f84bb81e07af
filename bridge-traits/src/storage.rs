//! Durable Client-Side Storage
//!
//! Key-value storage that survives application restarts. The session layer
//! persists its bearer credential here between runs.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific durable storage:
/// - Desktop: SQLite database in the user's data directory
/// - Web: localStorage
/// - Mobile: UserDefaults / SharedPreferences
///
/// # Security
///
/// Values may hold credentials. Implementations must never log stored values.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_token(store: &dyn SettingsStore, token: &str) -> Result<()> {
///     store.set_string("auth_token", token).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value, replacing any previous value for the key
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    ///
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
