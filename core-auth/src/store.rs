//! # Session Store
//!
//! Owns the authentication operations of the admin client: login, logout,
//! profile hydration and password change. All of them read and write the one
//! shared [`SessionHandle`] and reach the server through the
//! [`RequestPipeline`].
//!
//! ## Error Handling
//!
//! Login and password change record a human-readable message in the session's
//! `error` field and also return it, classified, as an [`AuthError`]:
//!
//! | Failure | Kind |
//! |---------|------|
//! | no response, undecodable body | `NetworkFailure` |
//! | HTTP 401 | `Unauthorized` |
//! | other status on login | `InvalidCredentials` |
//! | other status on password change | `ValidationFailure` |
//!
//! The message is the server's `error` field when present, otherwise a fixed
//! fallback. `logout` and `fetch_current_user` never fail.

use core_runtime::events::{AuthEvent, CoreEvent, EventBus, LogoutReason};
use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, AuthError, Result};
use crate::pipeline::RequestPipeline;
use crate::session::{SessionHandle, SessionState};
use crate::token_store::TokenStore;
use crate::types::{ChangePasswordRequest, LoginRequest, LoginResponse, UserProfile};

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const CURRENT_USER_ENDPOINT: &str = "/auth/me";
pub const CHANGE_PASSWORD_ENDPOINT: &str = "/auth/change-password";

/// Recorded when a login fails without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
/// Recorded when a password change fails without a server message.
pub const CHANGE_PASSWORD_FAILED_MESSAGE: &str = "Failed to change password";

/// Authentication operations over the shared session.
///
/// Cloning is cheap; clones operate on the same session.
#[derive(Clone, Debug)]
pub struct AuthStore {
    session: SessionHandle,
    pipeline: RequestPipeline,
    token_store: TokenStore,
    event_bus: EventBus,
}

impl AuthStore {
    pub fn new(
        session: SessionHandle,
        pipeline: RequestPipeline,
        token_store: TokenStore,
        event_bus: EventBus,
    ) -> Self {
        Self {
            session,
            pipeline,
            token_store,
            event_bus,
        }
    }

    /// Sign in with an email and password.
    ///
    /// On success the issued token and the user are stored in the session and
    /// the token is persisted. `loading` is true for the duration of the call.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let loading = self.session.begin_loading().await;
        info!("Logging in");

        let request = LoginRequest { email, password };
        let outcome = match self
            .pipeline
            .post_json::<_, LoginResponse>(LOGIN_ENDPOINT, &request)
            .await
        {
            Ok(response) => self.establish(response).await,
            Err(e) => Err(classify(e, LOGIN_FAILED_MESSAGE, AuthError::InvalidCredentials)),
        };

        match &outcome {
            Ok(()) => loading.finish(None).await,
            Err(e) => {
                warn!(error = %e, session_ended = e.is_session_fatal(), "Login failed");
                let message = e.user_message().to_string();
                loading.finish(Some(message.clone())).await;
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Auth(AuthEvent::LoginFailed { message }));
            }
        }

        outcome
    }

    async fn establish(&self, response: LoginResponse) -> Result<()> {
        let LoginResponse { token, user } = response;
        if token.trim().is_empty() {
            return Err(AuthError::NetworkFailure {
                message: LOGIN_FAILED_MESSAGE.to_string(),
                detail: "Login response carried an empty token".to_string(),
            });
        }

        let user_id = user.id;
        let role = user.role.clone();

        self.session
            .update(|state| state.establish(token.clone(), user))
            .await;

        // The in-memory session stays valid; only the next restart loses it.
        if let Err(e) = self.token_store.store_token(&token).await {
            warn!(error = %e, "Logged in without persisting the token");
        }

        info!(user_id, role = %role, "Logged in");
        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::LoggedIn { user_id, role }));
        Ok(())
    }

    /// Clear token, user and the persisted credential.
    ///
    /// Calling it again has no further effect.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end_session(LogoutReason::UserRequested).await;
    }

    async fn end_session(&self, reason: LogoutReason) {
        let had_token = self.session.update(SessionState::clear_credentials).await;

        // Already logged by the token store
        let _ = self.token_store.delete_token().await;

        if had_token {
            self.announce_logout(reason);
        } else {
            debug!(?reason, "Logout without an active session");
        }
    }

    fn announce_logout(&self, reason: LogoutReason) {
        info!(?reason, "Logged out");
        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::LoggedOut { reason }));
    }

    /// Load the profile of the token holder.
    ///
    /// Does nothing without a token. Any failure is logged and ends the
    /// session instead of being returned. The outcome only applies to the
    /// token the fetch was issued with; if the session was ended or replaced
    /// meanwhile, it is discarded.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) {
        let Some(token) = self.session.token().await else {
            debug!("No token held, skipping profile fetch");
            return;
        };

        match self
            .pipeline
            .get_json::<UserProfile>(CURRENT_USER_ENDPOINT)
            .await
        {
            Ok(user) => {
                let user_id = user.id;
                if self
                    .session
                    .update(|state| state.set_user_for(&token, user))
                    .await
                {
                    info!(user_id, "User profile loaded");
                    let _ = self
                        .event_bus
                        .emit(CoreEvent::Auth(AuthEvent::UserHydrated { user_id }));
                } else {
                    debug!(user_id, "Session changed while the profile was loading");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch current user");
                let ended = self
                    .session
                    .update(|state| state.clear_credentials_for(&token))
                    .await;
                if ended {
                    // Already logged by the token store
                    let _ = self.token_store.delete_token().await;
                    self.announce_logout(LogoutReason::HydrationFailed);
                } else {
                    debug!("Session already ended or replaced");
                }
            }
        }
    }

    /// Change the password of the signed-in user.
    ///
    /// Never alters token or user, except through a 401 which ends the session.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        let loading = self.session.begin_loading().await;
        info!("Changing password");

        let request = ChangePasswordRequest {
            current_password,
            new_password,
        };
        let outcome = self
            .pipeline
            .post_json_empty(CHANGE_PASSWORD_ENDPOINT, &request)
            .await
            .map_err(|e| {
                classify(
                    e,
                    CHANGE_PASSWORD_FAILED_MESSAGE,
                    AuthError::ValidationFailure,
                )
            });

        match &outcome {
            Ok(()) => {
                loading.finish(None).await;
                info!("Password changed");
                let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::PasswordChanged));
            }
            Err(e) => {
                warn!(
                    error = %e,
                    session_ended = e.is_session_fatal(),
                    "Password change failed"
                );
                let message = e.user_message().to_string();
                loading.finish(Some(message.clone())).await;
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Auth(AuthEvent::PasswordChangeFailed { message }));
            }
        }

        outcome
    }

    /// Seed the session from the persisted token, then load its profile.
    ///
    /// Returns whether the session is authenticated afterwards.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Result<bool> {
        if let Some(token) = self.token_store.load_token().await? {
            self.session
                .update(|state| state.restore_token(token))
                .await;
        }

        self.fetch_current_user().await;
        Ok(self.session.is_authenticated().await)
    }

    /// Handle to the shared session.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Copy of the session for display.
    pub async fn snapshot(&self) -> SessionState {
        self.session.snapshot().await
    }

    pub async fn token(&self) -> Option<String> {
        self.session.token().await
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.session.user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn is_admin(&self) -> bool {
        self.session.is_admin().await
    }

    pub async fn is_loading(&self) -> bool {
        self.session.is_loading().await
    }

    pub async fn error(&self) -> Option<String> {
        self.session.error().await
    }

    pub async fn clear_error(&self) {
        self.session.update(|state| state.error = None).await;
    }
}

fn classify(error: ApiError, fallback: &str, rejected: fn(String) -> AuthError) -> AuthError {
    let message = error.server_message().unwrap_or(fallback).to_string();
    match error.status() {
        Some(_) if error.is_unauthorized() => AuthError::Unauthorized(message),
        Some(_) => rejected(message),
        None => AuthError::NetworkFailure {
            message: fallback.to_string(),
            detail: error.to_string(),
        },
    }
}
