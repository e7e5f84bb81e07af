//! # Core Configuration Module
//!
//! Provides configuration management for the Angel Event client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host capabilities and settings the session layer
//! needs. It enforces fail-fast validation so a missing bridge or an
//! unresolvable API address is reported before any request is made.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - transport for API calls
//! - `SettingsStore` - durable storage for the bearer credential
//! - `NavigationHost` - hard redirects and page title
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults
//! (`ReqwestHttpClient`, `SqliteSettingsStore`, `DesktopNavigationHost`) are
//! injected automatically if not provided.
//!
//! ## API address
//!
//! Release builds always talk to the production API root (`/api`). Other
//! builds honour a development override (the `ANGEL_API_URL` environment
//! variable, or [`ApiConfig::with_dev_override`]) and fall back to the same
//! root. A relative root is resolved against the site origin.
//!
//! ```
//! use core_runtime::config::{ApiConfig, BuildProfile};
//!
//! let api = ApiConfig::new(BuildProfile::Release).with_site_origin("https://angel-event.fr");
//! assert_eq!(api.base_url().unwrap().as_str(), "https://angel-event.fr/api");
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Without desktop-shims this fails with Error::CapabilityMissing
//! let config = CoreConfig::builder()
//!     .site_origin("https://angel-event.fr")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, NavigationHost, SettingsStore};
use std::fmt;
#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Environment variable read for the development API override.
pub const API_URL_ENV: &str = "ANGEL_API_URL";

/// Production API root.
pub const DEFAULT_API_ROOT: &str = "/api";

/// Entry point of the admin area for unauthenticated users.
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// Durable storage key of the bearer credential.
pub const DEFAULT_TOKEN_STORAGE_KEY: &str = "auth_token";

/// Document title used when a route declares none.
pub const DEFAULT_TITLE: &str = "Angel Event";

/// Build profile the API address is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProfile {
    Release,
    Development,
}

impl BuildProfile {
    /// Profile of the running binary
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildProfile::Development
        } else {
            BuildProfile::Release
        }
    }
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self::current()
    }
}

/// API address configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiConfig {
    pub profile: BuildProfile,
    /// Base address used outside release builds, when set
    pub dev_override: Option<String>,
    /// Origin relative API roots are resolved against
    pub site_origin: Option<String>,
}

impl ApiConfig {
    pub fn new(profile: BuildProfile) -> Self {
        Self {
            profile,
            dev_override: None,
            site_origin: None,
        }
    }

    /// Configuration for the running binary, reading the override from `ANGEL_API_URL`.
    pub fn from_env() -> Self {
        let dev_override = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());

        Self {
            profile: BuildProfile::current(),
            dev_override,
            site_origin: None,
        }
    }

    pub fn with_dev_override(mut self, url: impl Into<String>) -> Self {
        self.dev_override = Some(url.into());
        self
    }

    pub fn with_site_origin(mut self, origin: impl Into<String>) -> Self {
        self.site_origin = Some(origin.into());
        self
    }

    /// The configured API root before resolution (`/api` or the override).
    pub fn api_root(&self) -> &str {
        match (self.profile, self.dev_override.as_deref()) {
            (BuildProfile::Development, Some(url)) => url,
            _ => DEFAULT_API_ROOT,
        }
    }

    /// Resolve the absolute base URL requests are joined onto.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the root is relative and no site origin is
    /// configured, or if either value is not a valid URL.
    pub fn base_url(&self) -> Result<Url> {
        let root = self.api_root();

        match Url::parse(root) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = self.site_origin.as_deref().ok_or_else(|| {
                    Error::Config(format!(
                        "API root '{}' is relative; set a site origin to resolve it",
                        root
                    ))
                })?;
                let origin = Url::parse(origin).map_err(|e| {
                    Error::Config(format!("Invalid site origin '{}': {}", origin, e))
                })?;
                origin
                    .join(root)
                    .map_err(|e| Error::Config(format!("Invalid API root '{}': {}", root, e)))
            }
            Err(e) => Err(Error::Config(format!("Invalid API root '{}': {}", root, e))),
        }
    }
}

/// Core configuration for the client core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub navigation_host: Arc<dyn NavigationHost>,
    pub api: ApiConfig,
    /// Hard-redirect target after a 401 and route the guard redirects to
    pub login_path: String,
    /// Durable storage key of the bearer credential
    pub token_storage_key: String,
    /// Title applied when the target route declares none
    pub default_title: String,
    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("navigation_host", &"NavigationHost { ... }")
            .field("api", &self.api)
            .field("login_path", &self.login_path)
            .field("token_storage_key", &self.token_storage_key)
            .field("default_title", &self.default_title)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Resolved API base URL.
    pub fn api_base_url(&self) -> Result<Url> {
        self.api.base_url()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The API base URL resolves
    /// - The login path is absolute
    /// - The token storage key is not empty
    /// - The event buffer can hold at least one event
    pub fn validate(&self) -> Result<()> {
        self.api.base_url()?;

        if !self.login_path.starts_with('/') {
            return Err(Error::Config(format!(
                "Login path must be absolute, got '{}'",
                self.login_path
            )));
        }

        if self.token_storage_key.trim().is_empty() {
            return Err(Error::Config(
                "Token storage key cannot be empty".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client: Arc<dyn HttpClient> = Arc::new(bridge_desktop::ReqwestHttpClient::new()?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "HttpClient implementation is required for API calls. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
         Web: inject a fetch-based client.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;

    let path = match path {
        Some(path) => path,
        None => SqliteSettingsStore::default_path()?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::open_lazy(path));
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store() -> Result<Arc<dyn SettingsStore>> {
    Err(capability_missing(
        "SettingsStore",
        "SettingsStore implementation is required to persist the session token. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
         Web: inject a localStorage-backed store.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_navigation_host() -> Result<Arc<dyn NavigationHost>> {
    let host: Arc<dyn NavigationHost> = Arc::new(bridge_desktop::DesktopNavigationHost::new());
    Ok(host)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_navigation_host() -> Result<Arc<dyn NavigationHost>> {
    Err(capability_missing(
        "NavigationHost",
        "NavigationHost implementation is required for forced logout redirects. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopNavigationHost. \
         Web: inject a window.location-backed host.",
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    navigation_host: Option<Arc<dyn NavigationHost>>,
    #[cfg(feature = "desktop-shims")]
    settings_path: Option<PathBuf>,
    api: Option<ApiConfig>,
    site_origin: Option<String>,
    login_path: Option<String>,
    token_storage_key: Option<String>,
    default_title: Option<String>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the durable storage holding the bearer credential.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the navigation host.
    pub fn navigation_host(mut self, host: Arc<dyn NavigationHost>) -> Self {
        self.navigation_host = Some(host);
        self
    }

    /// Database file for the default SQLite settings store.
    ///
    /// Ignored when a settings store is injected.
    #[cfg(feature = "desktop-shims")]
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the full API configuration.
    ///
    /// Default: [`ApiConfig::from_env`].
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    /// Origin the relative API root is resolved against
    /// (e.g. `https://angel-event.fr`). Overrides the origin in [`api`](Self::api).
    pub fn site_origin(mut self, origin: impl Into<String>) -> Self {
        self.site_origin = Some(origin.into());
        self
    }

    /// Default: `/admin/login`
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Default: `auth_token`
    pub fn token_storage_key(mut self, key: impl Into<String>) -> Self {
        self.token_storage_key = Some(key.into());
        self
    }

    /// Default: `Angel Event`
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = Some(title.into());
        self
    }

    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` if a required bridge is absent and no
    ///   platform default is available
    /// - `Error::Config` if a value is invalid
    pub fn build(self) -> Result<CoreConfig> {
        let mut api = self.api.unwrap_or_else(ApiConfig::from_env);
        if let Some(origin) = self.site_origin {
            api.site_origin = Some(origin);
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            #[cfg(feature = "desktop-shims")]
            None => provide_default_settings_store(self.settings_path)?,
            #[cfg(not(feature = "desktop-shims"))]
            None => provide_default_settings_store()?,
        };

        let navigation_host = match self.navigation_host {
            Some(host) => host,
            None => provide_default_navigation_host()?,
        };

        let config = CoreConfig {
            http_client,
            settings_store,
            navigation_host,
            api,
            login_path: self
                .login_path
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            token_storage_key: self
                .token_storage_key
                .unwrap_or_else(|| DEFAULT_TOKEN_STORAGE_KEY.to_string()),
            default_title: self
                .default_title
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct MockNavigationHost;

    #[async_trait]
    impl NavigationHost for MockNavigationHost {
        async fn hard_redirect(&self, _href: &str) -> BridgeResult<()> {
            Ok(())
        }

        fn set_title(&self, _title: &str) {}
    }

    fn with_mocks() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .navigation_host(Arc::new(MockNavigationHost))
            .api(ApiConfig::new(BuildProfile::Release))
    }

    #[test]
    fn test_release_profile_ignores_override() {
        let api = ApiConfig::new(BuildProfile::Release)
            .with_dev_override("http://localhost:8080/api")
            .with_site_origin("https://angel-event.fr");

        assert_eq!(api.api_root(), "/api");
        assert_eq!(api.base_url().unwrap().as_str(), "https://angel-event.fr/api");
    }

    #[test]
    fn test_development_profile_uses_override() {
        let api = ApiConfig::new(BuildProfile::Development)
            .with_dev_override("http://localhost:8080/api");

        assert_eq!(
            api.base_url().unwrap().as_str(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_development_profile_falls_back_to_api_root() {
        let api =
            ApiConfig::new(BuildProfile::Development).with_site_origin("http://localhost:5173");

        assert_eq!(api.api_root(), "/api");
        assert_eq!(api.base_url().unwrap().as_str(), "http://localhost:5173/api");
    }

    #[test]
    fn test_relative_root_requires_origin() {
        let api = ApiConfig::new(BuildProfile::Release);
        assert!(matches!(api.base_url(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_origin_is_config_error() {
        let api = ApiConfig::new(BuildProfile::Release).with_site_origin("not a url");
        assert!(matches!(api.base_url(), Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = with_mocks()
            .site_origin("https://angel-event.fr")
            .build()
            .unwrap();

        assert_eq!(config.login_path, "/admin/login");
        assert_eq!(config.token_storage_key, "auth_token");
        assert_eq!(config.default_title, "Angel Event");
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(
            config.api_base_url().unwrap().as_str(),
            "https://angel-event.fr/api"
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = with_mocks()
            .site_origin("https://angel-event.fr")
            .login_path("/connexion")
            .token_storage_key("session")
            .default_title("Angel")
            .event_buffer_size(8)
            .build()
            .unwrap();

        assert_eq!(config.login_path, "/connexion");
        assert_eq!(config.token_storage_key, "session");
        assert_eq!(config.default_title, "Angel");
        assert_eq!(config.event_buffer_size, 8);
    }

    #[test]
    fn test_builder_rejects_relative_login_path() {
        let result = with_mocks()
            .site_origin("https://angel-event.fr")
            .login_path("admin/login")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_empty_storage_key() {
        let result = with_mocks()
            .site_origin("https://angel-event.fr")
            .token_storage_key("  ")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_zero_event_buffer() {
        let result = with_mocks()
            .site_origin("https://angel-event.fr")
            .event_buffer_size(0)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_requires_resolvable_api() {
        let result = with_mocks().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .navigation_host(Arc::new(MockNavigationHost))
            .site_origin("https://angel-event.fr")
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_navigation_host() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .site_origin("https://angel-event.fr")
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "NavigationHost"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let path = std::env::temp_dir()
            .join(format!("core-runtime-config-{}", std::process::id()))
            .join("session.db");

        let config = CoreConfig::builder()
            .api(ApiConfig::new(BuildProfile::Release))
            .site_origin("https://angel-event.fr")
            .settings_path(&path)
            .build()
            .unwrap();

        assert_eq!(config.token_storage_key, "auth_token");
        // The default store is lazy and has not touched the filesystem yet
        assert!(!path.exists());
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = with_mocks()
            .site_origin("https://angel-event.fr")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("HttpClient { ... }"));
        assert!(debug.contains("login_path"));
    }
}
