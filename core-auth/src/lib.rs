//! # Authentication Module
//!
//! Client-side session layer of the Angel Event admin area.
//!
//! ## Overview
//!
//! Three components, composed as guard → store → pipeline → server:
//!
//! - [`RequestPipeline`] wraps every API call. Its stages attach the bearer
//!   credential and end the session on any 401.
//! - [`AuthStore`] holds the one session (token, user, loading, error) and
//!   runs login, logout, profile hydration and password change.
//! - [`NavigationGuard`] runs before each route transition and allows it,
//!   redirects to the login page, or loads the profile first.
//!
//! [`AuthRuntime`] wires them around a single shared [`SessionHandle`].
//!
//! ## Features
//!
//! - Bearer token persisted under `auth_token` in the host settings store
//! - Global 401 handling with a forced redirect to `/admin/login`
//! - Route metadata inheritance (`requires_auth`, page title)
//! - Session events on the core event bus

pub mod error;
pub mod guard;
pub mod pipeline;
pub mod routes;
pub mod runtime;
pub mod session;
pub mod stages;
pub mod store;
pub mod token_store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{ApiError, AuthError, Result};
pub use guard::{GuardDecision, NavigationGuard, RedirectReason};
pub use pipeline::{RequestPipeline, RequestStage, RequestSummary, ResponseStage};
pub use routes::{RouteLocation, RouteMeta, RouteRecord, RouteTable};
pub use runtime::AuthRuntime;
pub use session::{SessionHandle, SessionState};
pub use stages::{BearerTokenStage, UnauthorizedStage};
pub use store::AuthStore;
pub use token_store::TokenStore;
pub use types::{UserProfile, ADMIN_ROLE};
