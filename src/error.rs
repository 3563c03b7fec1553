//! Error handling for the VetDesk client

use std::fmt;
use thiserror::Error;
use vetdesk_auth::AuthError;
use vetdesk_schedule::ScheduleError;

/// Unified error type for the VetDesk client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Malformed reservation date or time slot
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// The backend answered with an error envelope or a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Input rejected before it was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new API error
    pub fn api<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether the caller has to log in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::Auth(err) if err.requires_login())
    }
}
