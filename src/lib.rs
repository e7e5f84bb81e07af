//! Workspace facade crate.
//!
//! Re-exports the client core so a host application can depend on
//! `angel-event-core` alone. The `desktop-shims` feature (default) pulls in the
//! native bridge implementations and lets [`CoreConfig`] fill in missing host
//! capabilities on its own.
//!
//! ```no_run
//! use angel_event_core::{AuthRuntime, CoreConfig, EventBus};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CoreConfig::builder()
//!     .site_origin("https://angel-event.fr")
//!     .build()?;
//! let runtime = AuthRuntime::bootstrap(&config, EventBus::default()).await?;
//!
//! let decision = runtime.guard().before_each("/admin/bookings").await;
//! println!("{decision:?}");
//! # Ok(())
//! # }
//! ```

pub use bridge_traits;
pub use core_auth;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_auth::{
    AuthError, AuthRuntime, AuthStore, GuardDecision, NavigationGuard, RequestPipeline,
    RouteTable, SessionHandle,
};
pub use core_runtime::config::CoreConfig;
pub use core_runtime::events::EventBus;
