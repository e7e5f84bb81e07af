//! # Host Bridge Traits
//!
//! Capability traits that a host application implements for the Angel Event
//! client core.
//!
//! ## Overview
//!
//! The core never performs I/O on its own. Each trait below is a capability the
//! session layer needs but that differs per host (native desktop, embedded
//! webview, test harness).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport with retry policy
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage for the bearer credential
//! - [`NavigationHost`](navigation::NavigationHost) - Hard redirects and page title
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let http_client = config.http_client.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "HttpClient".to_string(),
//!     message: "No HTTP client implementation provided. \
//!               Desktop: ensure default feature is enabled."
//!         .to_string(),
//! })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and keep credential material out of the
//! messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod http;
pub mod log;
pub mod navigation;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use navigation::NavigationHost;
pub use storage::SettingsStore;
