//! Shared authentication state.
//!
//! One [`SessionHandle`] exists per running client. The pipeline stages, the
//! store and the guard all hold clones of it and therefore observe the same
//! state. Mutations go through [`SessionHandle::update`], which applies a
//! synchronous closure under the write lock: the lock is never held across a
//! network or storage await.

use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tracing::warn;

use crate::types::UserProfile;

/// Authentication state of the client.
///
/// `user` is only ever set while `token` is present.
#[derive(Clone, Default, PartialEq)]
pub struct SessionState {
    token: Option<String>,
    user: Option<UserProfile>,
    /// True while a login or password change is outstanding.
    pub loading: bool,
    /// Last failure message from login or password change.
    pub error: Option<String>,
    loading_generation: u64,
}

impl SessionState {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Depends on the token alone.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }

    /// Store a freshly issued credential together with its owner.
    pub fn establish(&mut self, token: String, user: UserProfile) {
        self.token = Some(token);
        self.user = Some(user);
    }

    /// Seed the credential read from durable storage. The profile is unknown
    /// until it is fetched again.
    pub fn restore_token(&mut self, token: String) {
        if self.token.as_deref() != Some(token.as_str()) {
            self.user = None;
        }
        self.token = Some(token);
    }

    /// Attach a profile fetched with `token`.
    ///
    /// Ignored unless the session still holds that exact credential, so a
    /// reply that outlived a logout or a change of account is dropped.
    /// Returns whether the profile was kept.
    pub fn set_user_for(&mut self, token: &str, user: UserProfile) -> bool {
        if self.token.as_deref() != Some(token) {
            return false;
        }
        self.user = Some(user);
        true
    }

    /// Drop token and user. Returns whether a credential was held.
    pub fn clear_credentials(&mut self) -> bool {
        self.user = None;
        self.token.take().is_some()
    }

    /// Drop token and user only while `token` is the held credential.
    pub fn clear_credentials_for(&mut self, token: &str) -> bool {
        if self.token.as_deref() != Some(token) {
            return false;
        }
        self.clear_credentials()
    }

    fn release_loading(&mut self, generation: u64) {
        if self.loading_generation == generation {
            self.loading = false;
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

/// Cloneable handle to the single [`SessionState`] of the client.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle seeded with a credential read from storage.
    pub fn with_token(token: Option<String>) -> Self {
        let mut state = SessionState::default();
        if let Some(token) = token {
            state.restore_token(token);
        }
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    /// Apply `f` to the state under the write lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.write().await;
        f(&mut state)
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_authenticated()
    }

    pub async fn is_admin(&self) -> bool {
        self.inner.read().await.is_admin()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.read().await.error.clone()
    }

    /// Whether both handles point at the same session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Mark an operation as outstanding and clear the previous error.
    ///
    /// `loading` is reset when the returned guard is finished or dropped.
    pub(crate) async fn begin_loading(&self) -> LoadingGuard {
        let generation = self
            .update(|state| {
                state.loading = true;
                state.error = None;
                state.loading_generation = state.loading_generation.wrapping_add(1);
                state.loading_generation
            })
            .await;

        LoadingGuard {
            session: self.clone(),
            generation,
            armed: true,
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Ok(state) => f.debug_tuple("SessionHandle").field(&*state).finish(),
            Err(_) => f.write_str("SessionHandle { <locked> }"),
        }
    }
}

/// Clears `loading` on every exit path of a store operation.
pub(crate) struct LoadingGuard {
    session: SessionHandle,
    generation: u64,
    armed: bool,
}

impl LoadingGuard {
    /// Clear `loading` and record the outcome message.
    pub(crate) async fn finish(mut self, error: Option<String>) {
        self.armed = false;
        self.session
            .update(|state| {
                state.loading = false;
                state.error = error;
            })
            .await;
    }
}

impl Drop for LoadingGuard {
    // Reached without `finish` only when the operation future is dropped
    // mid-flight. A later operation owns the flag once it has begun, hence
    // the generation check.
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;

        if let Ok(mut state) = self.session.inner.try_write() {
            state.release_loading(generation);
            return;
        }

        // A reader holds the lock; reset once it is released.
        match Handle::try_current() {
            Ok(handle) => {
                let session = self.session.clone();
                handle.spawn(async move {
                    session.inner.write().await.release_loading(generation);
                });
            }
            Err(_) => warn!("Session locked outside a runtime, loading flag left set"),
        }
    }
}
