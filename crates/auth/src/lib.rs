//! VetDesk Auth client for Rust
//!
//! This crate owns the credential lifecycle of a VetDesk client: login and
//! signup, access-token expiry, refresh (single-flight), logout, and the
//! authenticated request path that every resource call goes through.

mod clock;
mod envelope;
mod session;
mod store;
mod types;

use std::time::Duration;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{ApiResponse, ErrorInfo};
pub use session::SessionManager;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{AuthHeader, AuthState, Credentials, StaffRole, UserProfile, UserType};

/// Lifetime the backend grants an access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Storage key under which the credential record is persisted.
pub const CREDENTIALS_KEY: &str = "_credentials";

/// Errors surfaced by the session manager
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport failure, no response was received
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Login or signup was rejected by the backend
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The refresh token was rejected; the session has been cleared
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    /// The operation needs a session and there is none
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    /// A concurrent refresh this caller joined failed transiently
    #[error("Refresh unavailable: {0}")]
    RefreshUnavailable(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Request body cannot be replayed")]
    UnreplayableRequest,
}

impl AuthError {
    /// Whether this error means the caller must authenticate again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::RefreshFailed(_) | Self::NotAuthenticated)
    }
}

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Refresh an expired access token before handing out a header
    pub auto_refresh_token: bool,
    /// Write the credential record through to the key/value store
    ///
    /// Login and signup fail with `StorageError` when the record cannot be
    /// written. Later writes (refresh, profile reload) only log the failure,
    /// since the new tokens are already in use.
    pub persist_session: bool,
    /// Key of the persisted credential record
    pub storage_key: String,
    /// Lifetime assumed for a freshly issued access token
    pub access_token_ttl: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            storage_key: CREDENTIALS_KEY.to_string(),
            access_token_ttl: ACCESS_TOKEN_TTL,
        }
    }
}

impl SessionOptions {
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    pub fn with_storage_key(mut self, value: &str) -> Self {
        self.storage_key = value.to_string();
        self
    }

    pub fn with_access_token_ttl(mut self, value: Duration) -> Self {
        self.access_token_ttl = value;
        self
    }
}
