//! # Event Bus System
//!
//! Provides an event-driven architecture for the client core using `tokio::sync::broadcast`.
//! The session store and navigation guard publish typed events here so a host UI
//! can react (toast on failed login, close admin panes on forced logout, ...)
//! without polling the session.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Session Store├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │ (broadcast│                  └────────────┘
//! │ 401 Handler  ├──────────────>│  channel) │     subscribe    ┌────────────┐
//! └──────────────┘               │           ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │           │                  └────────────┘
//! │ Nav Guard    ├──────────────>│           │
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Auth(AuthEvent::LoggedIn {
//!         user_id: 1,
//!         role: "admin".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Administrator logged in");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error; publishers ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session and credential events
    Auth(AuthEvent),
    /// Route guard and forced navigation events
    Navigation(NavigationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Navigation(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::SessionExpired { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::LoginFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::PasswordChangeFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::LoggedIn { .. }) => EventSeverity::Info,
            CoreEvent::Auth(AuthEvent::LoggedOut { .. }) => EventSeverity::Info,
            CoreEvent::Auth(AuthEvent::PasswordChanged) => EventSeverity::Info,
            CoreEvent::Navigation(NavigationEvent::HardRedirect { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Why a session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogoutReason {
    /// Explicit logout from the UI
    UserRequested,
    /// Profile could not be fetched for a stored token
    HydrationFailed,
    /// Server answered 401 to some request
    Unauthorized,
}

/// Events related to the admin session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Login succeeded and the token was stored.
    LoggedIn {
        /// Identifier of the authenticated user.
        user_id: u64,
        /// Role classifier reported by the server.
        role: String,
    },
    /// Login was rejected or could not reach the server.
    LoginFailed {
        /// The message shown to the user.
        message: String,
    },
    /// Session cleared.
    LoggedOut { reason: LogoutReason },
    /// Profile loaded for a token restored from storage.
    UserHydrated { user_id: u64 },
    /// A request came back 401 and the credential was dropped.
    SessionExpired {
        /// Path of the request that was rejected.
        path: String,
    },
    PasswordChanged,
    PasswordChangeFailed { message: String },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::LoggedIn { .. } => "Administrator logged in",
            AuthEvent::LoginFailed { .. } => "Login failed",
            AuthEvent::LoggedOut { .. } => "Session cleared",
            AuthEvent::UserHydrated { .. } => "User profile loaded",
            AuthEvent::SessionExpired { .. } => "Session expired",
            AuthEvent::PasswordChanged => "Password changed",
            AuthEvent::PasswordChangeFailed { .. } => "Password change failed",
        }
    }
}

// ============================================================================
// Navigation Events
// ============================================================================

/// Why the guard refused a navigation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RedirectReason {
    /// Route requires a session and no token is held
    NotAuthenticated,
    /// A token was held but the server no longer accepts it
    SessionExpired,
}

/// Events related to route transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NavigationEvent {
    /// The guard redirected a navigation attempt.
    Redirected {
        /// Full path the user asked for.
        from: String,
        /// Rendered redirect target.
        to: String,
        reason: RedirectReason,
    },
    /// A top-level navigation was forced outside the router.
    HardRedirect { href: String },
}

impl NavigationEvent {
    fn description(&self) -> &str {
        match self {
            NavigationEvent::Redirected { .. } => "Navigation redirected",
            NavigationEvent::HardRedirect { .. } => "Forced navigation",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` must be greater than zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let auth_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Auth(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
