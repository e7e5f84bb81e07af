use thiserror::Error;

/// Failures of a single call through the [`RequestPipeline`](crate::RequestPipeline).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received (connection refused, timeout, TLS...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("Server responded with HTTP {status}")]
    Status {
        status: u16,
        /// `error` field of the JSON error body, when present.
        message: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message supplied by the server in the error body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Classified failures of the session store.
///
/// Every variant carries the human-readable message that the store records in
/// its `error` field; [`AuthError::user_message`] returns it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Network failure: {detail}")]
    NetworkFailure {
        /// Message shown to the user.
        message: String,
        /// Underlying transport or decode error.
        detail: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token storage unavailable: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// The message recorded in the session's `error` field.
    pub fn user_message(&self) -> &str {
        match self {
            AuthError::InvalidCredentials(message)
            | AuthError::ValidationFailure(message)
            | AuthError::Unauthorized(message)
            | AuthError::Storage(message)
            | AuthError::Config(message) => message,
            AuthError::NetworkFailure { message, .. } => message,
        }
    }

    /// Whether the failure ended the session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, AuthError::Unauthorized(_))
    }
}

impl From<core_runtime::Error> for AuthError {
    fn from(error: core_runtime::Error) -> Self {
        AuthError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
