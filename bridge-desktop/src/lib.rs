//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `NavigationHost` recording location and title in process
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopNavigationHost, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::open_default().await?;
//!     let navigation = DesktopNavigationHost::new();
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod navigation;
mod settings;

pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
pub use navigation::DesktopNavigationHost;
pub use settings::SqliteSettingsStore;
