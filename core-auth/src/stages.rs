//! Session-aware pipeline stages.
//!
//! - [`BearerTokenStage`] attaches `Authorization: Bearer <token>` when the
//!   session holds a token.
//! - [`UnauthorizedStage`] ends the session whenever any endpoint answers 401.

use async_trait::async_trait;
use bridge_traits::http::{HttpRequest, HttpResponse, AUTHORIZATION_HEADER};
use bridge_traits::navigation::NavigationHost;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, LogoutReason, NavigationEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::pipeline::{RequestStage, RequestSummary, ResponseStage};
use crate::session::SessionHandle;
use crate::token_store::TokenStore;

/// Attaches the session's bearer credential to outbound requests.
pub struct BearerTokenStage {
    session: SessionHandle,
}

impl BearerTokenStage {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RequestStage for BearerTokenStage {
    fn name(&self) -> &'static str {
        "bearer-token"
    }

    async fn on_request(&self, request: &mut HttpRequest) {
        if let Some(token) = self.session.token().await {
            request
                .headers
                .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", token));
        }
    }
}

/// Treats any 401 as the end of the session.
///
/// Before the rejected call returns to its caller this stage removes the
/// persisted token, clears token and user from the session and forces a
/// top-level navigation to the login page.
pub struct UnauthorizedStage {
    session: SessionHandle,
    token_store: TokenStore,
    navigation: Arc<dyn NavigationHost>,
    event_bus: EventBus,
    login_path: String,
}

impl UnauthorizedStage {
    pub fn new(
        session: SessionHandle,
        token_store: TokenStore,
        navigation: Arc<dyn NavigationHost>,
        event_bus: EventBus,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            session,
            token_store,
            navigation,
            event_bus,
            login_path: login_path.into(),
        }
    }
}

#[async_trait]
impl ResponseStage for UnauthorizedStage {
    fn name(&self) -> &'static str {
        "unauthorized"
    }

    async fn on_response(&self, request: &RequestSummary, response: &HttpResponse) {
        if !response.is_unauthorized() {
            return;
        }

        warn!(
            method = %request.method,
            path = %request.path,
            "Credential rejected, ending session"
        );

        // Storage failures are already logged; the in-memory session is
        // cleared regardless.
        let _ = self.token_store.delete_token().await;

        let had_token = self.session.update(|state| state.clear_credentials()).await;
        debug!(had_token, "Session cleared after 401");

        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SessionExpired {
            path: request.path.clone(),
        }));
        if had_token {
            let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::LoggedOut {
                reason: LogoutReason::Unauthorized,
            }));
        }

        if let Err(e) = self.navigation.hard_redirect(&self.login_path).await {
            warn!(href = %self.login_path, error = %e, "Hard redirect to login failed");
            return;
        }

        let _ = self
            .event_bus
            .emit(CoreEvent::Navigation(NavigationEvent::HardRedirect {
                href: self.login_path.clone(),
            }));
        info!(href = %self.login_path, "Redirected to login");
    }
}
