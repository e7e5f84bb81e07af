//! Persisted Bearer Credential
//!
//! Keeps the session token in the host [`SettingsStore`] under a single key
//! (`auth_token` by default) so a restarted client can resume its session.
//!
//! ## Security Features
//!
//! - Token values are never logged or included in error messages
//! - Storage failures are logged with the key only
//! - Blank values left behind by a broken writer are treated as absent and removed
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::TokenStore;
//! use std::sync::Arc;
//! # use bridge_traits::storage::SettingsStore;
//! # async fn example(settings: Arc<dyn SettingsStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(settings, "auth_token");
//!
//! token_store.store_token("issued-token").await?;
//! let restored = token_store.load_token().await?;
//! token_store.delete_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use bridge_traits::storage::SettingsStore;
use core_runtime::config::CoreConfig;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable storage for the bearer credential.
#[derive(Clone)]
pub struct TokenStore {
    settings: Arc<dyn SettingsStore>,
    key: String,
}

impl TokenStore {
    /// Create a token store writing under `key`.
    pub fn new(settings: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Initializing TokenStore");
        Self { settings, key }
    }

    /// Token store over the configured settings store and storage key.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.settings_store),
            config.token_storage_key.clone(),
        )
    }

    /// Storage key holding the token.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persist the token, replacing any previous one.
    pub async fn store_token(&self, token: &str) -> Result<()> {
        self.settings
            .set_string(&self.key, token)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to persist token");
                AuthError::Storage(format!("Failed to persist token: {}", e))
            })?;

        info!(key = %self.key, "Token persisted");
        Ok(())
    }

    /// Read the persisted token.
    ///
    /// Returns `Ok(None)` if no token is stored.
    pub async fn load_token(&self) -> Result<Option<String>> {
        let value = self.settings.get_string(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read token");
            AuthError::Storage(format!("Failed to read token: {}", e))
        })?;

        match value {
            Some(token) if token.trim().is_empty() => {
                warn!(key = %self.key, "Stored token is blank, removing it");
                let _ = self.delete_token().await;
                Ok(None)
            }
            Some(token) => {
                debug!(key = %self.key, "Token restored from storage");
                Ok(Some(token))
            }
            None => {
                debug!(key = %self.key, "No stored token");
                Ok(None)
            }
        }
    }

    /// Remove the persisted token. Removing a missing token succeeds.
    pub async fn delete_token(&self) -> Result<()> {
        self.settings.delete(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to delete token");
            AuthError::Storage(format!("Failed to delete token: {}", e))
        })?;

        info!(key = %self.key, "Token removed from storage");
        Ok(())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    // Mock SettingsStore for testing
    #[derive(Default)]
    struct MockSettingsStore {
        data: Arc<Mutex<HashMap<String, String>>>,
    }

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.data
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.data.lock().await.keys().cloned().collect())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            self.data.lock().await.clear();
            Ok(())
        }
    }

    struct BrokenSettingsStore;

    #[async_trait]
    impl SettingsStore for BrokenSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("disk full".to_string()))
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Err(BridgeError::NotAvailable("locked".to_string()))
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("locked".to_string()))
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_load_delete() {
        let settings = Arc::new(MockSettingsStore::default());
        let token_store = TokenStore::new(settings.clone(), "auth_token");

        token_store.store_token("tok-1").await.unwrap();
        assert_eq!(
            settings.data.lock().await.get("auth_token"),
            Some(&"tok-1".to_string())
        );
        assert_eq!(
            token_store.load_token().await.unwrap(),
            Some("tok-1".to_string())
        );

        token_store.delete_token().await.unwrap();
        assert_eq!(token_store.load_token().await.unwrap(), None);

        // Idempotent
        token_store.delete_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_token_is_removed() {
        let settings = Arc::new(MockSettingsStore::default());
        settings
            .data
            .lock()
            .await
            .insert("auth_token".to_string(), "  ".to_string());

        let token_store = TokenStore::new(settings.clone(), "auth_token");
        assert_eq!(token_store.load_token().await.unwrap(), None);
        assert!(settings.data.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_errors_do_not_leak_token() {
        let token_store = TokenStore::new(Arc::new(BrokenSettingsStore), "auth_token");

        let error = token_store.store_token("very-secret").await.unwrap_err();
        assert!(matches!(error, AuthError::Storage(_)));
        assert!(!error.to_string().contains("very-secret"));

        assert!(matches!(
            token_store.load_token().await,
            Err(AuthError::Storage(_))
        ));
        assert!(matches!(
            token_store.delete_token().await,
            Err(AuthError::Storage(_))
        ));
    }

    #[test]
    fn test_debug_shows_key_only() {
        let token_store = TokenStore::new(Arc::new(MockSettingsStore::default()), "auth_token");
        assert_eq!(format!("{:?}", token_store), "TokenStore { key: \"auth_token\", .. }");
    }
}
