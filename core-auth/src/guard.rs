//! # Navigation Guard
//!
//! Runs before every route transition and decides whether it may proceed.
//!
//! ## Decision flow
//!
//! ```text
//! set page title
//!   │
//!   ├─ route is public ─────────────────────────────> Allow
//!   ├─ no token ────────────────────────────────────> Redirect(login, NotAuthenticated)
//!   ├─ token, profile missing ─> fetch_current_user
//!   │      ├─ still authenticated ──────────────────> Allow
//!   │      └─ session ended ────────────────────────> Redirect(login, SessionExpired)
//!   └─ token, profile loaded ───────────────────────> Allow
//! ```
//!
//! The guard never retries; a failed hydration ends the session through the
//! store.

use bridge_traits::navigation::NavigationHost;
use core_runtime::config::{DEFAULT_LOGIN_PATH, DEFAULT_TITLE};
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::routes::{ResolvedTarget, RouteLocation, RouteTable, LOGIN_ROUTE_NAME, REDIRECT_QUERY_KEY};
use crate::store::AuthStore;

pub use core_runtime::events::RedirectReason;

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: RouteLocation,
        reason: RedirectReason,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Access control for route transitions.
#[derive(Clone)]
pub struct NavigationGuard {
    store: AuthStore,
    routes: Arc<RouteTable>,
    navigation: Arc<dyn NavigationHost>,
    event_bus: EventBus,
    login_path: String,
    default_title: String,
}

impl NavigationGuard {
    pub fn new(
        store: AuthStore,
        routes: Arc<RouteTable>,
        navigation: Arc<dyn NavigationHost>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            routes,
            navigation,
            event_bus,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Path used when the route table has no login route.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Title applied when the target declares none.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether navigation to `target` (path, optional query) may proceed.
    #[instrument(skip(self))]
    pub async fn before_each(&self, target: &str) -> GuardDecision {
        let resolved = self.routes.resolve(target);

        let title = resolved
            .meta
            .title
            .as_deref()
            .unwrap_or(&self.default_title);
        self.navigation.set_title(title);

        if !resolved.meta.requires_auth() {
            debug!(route = ?resolved.name, "Public route");
            return GuardDecision::Allow;
        }

        let session = self.store.snapshot().await;
        if !session.is_authenticated() {
            return self.redirect(&resolved, RedirectReason::NotAuthenticated);
        }

        if session.user().is_none() {
            debug!("Loading profile before entering protected route");
            self.store.fetch_current_user().await;

            if !self.store.is_authenticated().await {
                return self.redirect(&resolved, RedirectReason::SessionExpired);
            }
        }

        debug!(route = ?resolved.name, "Protected route allowed");
        GuardDecision::Allow
    }

    /// The login route carrying `return_to` as its `redirect` parameter.
    pub fn login_location(&self, return_to: &str) -> RouteLocation {
        let path = self
            .routes
            .find_by_name(LOGIN_ROUTE_NAME)
            .map_or(self.login_path.as_str(), |route| route.path.as_str());

        RouteLocation::named(LOGIN_ROUTE_NAME, path).with_query(REDIRECT_QUERY_KEY, return_to)
    }

    fn redirect(&self, target: &ResolvedTarget, reason: RedirectReason) -> GuardDecision {
        let to = self.login_location(&target.full_path);

        info!(from = %target.full_path, to = %to, ?reason, "Navigation redirected to login");
        let _ = self
            .event_bus
            .emit(CoreEvent::Navigation(NavigationEvent::Redirected {
                from: target.full_path.clone(),
                to: to.href(),
                reason,
            }));

        GuardDecision::Redirect { to, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RequestPipeline;
    use crate::session::SessionHandle;
    use crate::test_support::{MemorySettingsStore, RecordingNavigationHost, ScriptedHttpClient};
    use crate::token_store::TokenStore;
    use url::Url;

    struct Harness {
        guard: NavigationGuard,
        client: Arc<ScriptedHttpClient>,
        navigation: Arc<RecordingNavigationHost>,
        session: SessionHandle,
    }

    fn harness(token: Option<&str>) -> Harness {
        let client = Arc::new(ScriptedHttpClient::default());
        let navigation = Arc::new(RecordingNavigationHost::default());
        let event_bus = EventBus::new(8);
        let session = SessionHandle::with_token(token.map(str::to_string));

        let pipeline = RequestPipeline::new(
            Url::parse("https://angel-event.fr/api").unwrap(),
            client.clone(),
        );
        let store = AuthStore::new(
            session.clone(),
            pipeline,
            TokenStore::new(Arc::new(MemorySettingsStore::default()), "auth_token"),
            event_bus.clone(),
        );

        Harness {
            guard: NavigationGuard::new(
                store,
                Arc::new(RouteTable::angel_event()),
                navigation.clone(),
                event_bus,
            ),
            client,
            navigation,
            session,
        }
    }

    #[tokio::test]
    async fn test_public_route_allowed_without_session() {
        let h = harness(None);
        assert_eq!(h.guard.before_each("/contact").await, GuardDecision::Allow);
        assert_eq!(
            h.navigation.last_title(),
            Some("Contact - Angel Event".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_route_gets_default_title() {
        let h = harness(None).guard.with_default_title("Angel Event");
        let navigation = Arc::new(RecordingNavigationHost::default());
        let guard = NavigationGuard {
            navigation: navigation.clone(),
            ..h
        };

        assert!(guard.before_each("/does-not-exist").await.is_allowed());
        assert_eq!(navigation.last_title(), Some("Angel Event".to_string()));
    }

    #[tokio::test]
    async fn test_protected_route_without_token_redirects() {
        let h = harness(None);
        let decision = h.guard.before_each("/admin/bookings").await;

        match decision {
            GuardDecision::Redirect { to, reason } => {
                assert_eq!(reason, RedirectReason::NotAuthenticated);
                assert_eq!(to.name.as_deref(), Some(LOGIN_ROUTE_NAME));
                assert_eq!(to.path, "/admin/login");
                assert_eq!(to.query_value("redirect"), Some("/admin/bookings"));
            }
            GuardDecision::Allow => panic!("expected a redirect"),
        }
        assert!(h.client.requests().is_empty());
        assert_eq!(
            h.navigation.last_title(),
            Some("Réservations - Admin".to_string())
        );
    }

    #[tokio::test]
    async fn test_protected_route_keeps_query_in_return_path() {
        let h = harness(None);
        let decision = h.guard.before_each("/admin/clients?page=2").await;

        let GuardDecision::Redirect { to, .. } = decision else {
            panic!("expected a redirect");
        };
        assert_eq!(to.href(), "/admin/login?redirect=%2Fadmin%2Fclients%3Fpage%3D2");
    }

    #[tokio::test]
    async fn test_hydrates_missing_profile_then_allows() {
        let h = harness(Some("tok"));
        h.client.respond(200, r#"{"id": 3, "role": "admin"}"#);

        assert_eq!(h.guard.before_each("/admin").await, GuardDecision::Allow);
        assert_eq!(h.session.user().await.map(|u| u.id), Some(3));

        // Profile already loaded: no second request
        assert_eq!(h.guard.before_each("/admin/gallery").await, GuardDecision::Allow);
        assert_eq!(h.client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_hydration_redirects_as_expired() {
        let h = harness(Some("tok"));
        h.client.respond(500, "");

        let decision = h.guard.before_each("/admin/newsletter").await;

        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: RouteLocation::named(LOGIN_ROUTE_NAME, "/admin/login")
                    .with_query(REDIRECT_QUERY_KEY, "/admin/newsletter"),
                reason: RedirectReason::SessionExpired,
            }
        );
        assert!(!h.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_path_fallback_without_login_route() {
        let h = harness(None);
        let guard = NavigationGuard {
            routes: Arc::new(RouteTable::new(Vec::new())),
            ..h.guard
        }
        .with_login_path("/connexion");

        let location = guard.login_location("/admin");
        assert_eq!(location.href(), "/connexion?redirect=%2Fadmin");
    }
}
