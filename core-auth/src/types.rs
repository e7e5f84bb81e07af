//! Wire types of the authentication endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role classifier that grants access to the admin area.
pub const ADMIN_ROLE: &str = "admin";

/// Profile of the signed-in user, as returned by `/auth/login` and `/auth/me`.
///
/// Attributes the client does not model are kept in `extra` so that a UI can
/// still display them.
///
/// # Examples
///
/// ```
/// use core_auth::UserProfile;
///
/// let user: UserProfile = serde_json::from_str(
///     r#"{"id": 1, "email": "admin@angel-event.fr", "name": "Admin", "role": "admin"}"#,
/// ).unwrap();
/// assert!(user.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Empty when the server omits it, which never grants admin access.
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful answer to `POST /auth/login`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Body of `POST /auth/change-password`.
#[derive(Clone, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

impl fmt::Debug for ChangePasswordRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("current_password", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}
