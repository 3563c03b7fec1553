//! Configuration options for the VetDesk client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use vetdesk_auth::{SessionOptions, ACCESS_TOKEN_TTL, CREDENTIALS_KEY};
use vetdesk_schedule::SlotGrid;

use crate::error::Error;

/// Configuration options for the VetDesk client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the clinic API
    pub api_url: String,

    /// Whether to automatically refresh the token
    pub auto_refresh_token: bool,

    /// Whether to keep the credential record in the key/value store
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Key of the persisted credential record
    pub storage_key: String,

    /// Directory for a file-backed store; in-memory when unset
    pub storage_dir: Option<PathBuf>,

    /// Lifetime assumed for a freshly issued access token
    pub access_token_ttl: Duration,

    /// Grid reservations are checked against before submission
    pub slot_grid: SlotGrid,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            storage_key: CREDENTIALS_KEY.to_string(),
            storage_dir: None,
            access_token_ttl: ACCESS_TOKEN_TTL,
            slot_grid: SlotGrid::default(),
        }
    }
}

impl ClientOptions {
    pub fn new(api_url: &str) -> Self {
        Self::default().with_api_url(api_url)
    }

    /// Read options from the environment
    ///
    /// * `VETDESK_API_URL` - required
    /// * `VETDESK_REQUEST_TIMEOUT_SECS` - optional, `0` disables the timeout
    /// * `VETDESK_STORAGE_DIR` - optional, enables the file-backed store
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("VETDESK_API_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::config("VETDESK_API_URL must be set"))?;
        let mut options = Self::new(api_url.trim());

        if let Some(raw) = lookup("VETDESK_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::config(format!("VETDESK_REQUEST_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(dir) = lookup("VETDESK_STORAGE_DIR").filter(|dir| !dir.is_empty()) {
            options.storage_dir = Some(PathBuf::from(dir));
        }

        Ok(options)
    }

    /// Set the API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_storage_key(mut self, value: &str) -> Self {
        self.storage_key = value.to_string();
        self
    }

    pub fn with_storage_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(value.into());
        self
    }

    pub fn with_access_token_ttl(mut self, value: Duration) -> Self {
        self.access_token_ttl = value;
        self
    }

    pub fn with_slot_grid(mut self, value: SlotGrid) -> Self {
        self.slot_grid = value;
        self
    }

    /// The session-level subset of these options.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default()
            .with_auto_refresh_token(self.auto_refresh_token)
            .with_persist_session(self.persist_session)
            .with_storage_key(&self.storage_key)
            .with_access_token_ttl(self.access_token_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new("https://api.clinic.test/");
        assert_eq!(options.api_url, "https://api.clinic.test");
        assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.access_token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(options.slot_grid, SlotGrid::default());

        let session = options.with_auto_refresh_token(false).session_options();
        assert!(!session.auto_refresh_token);
        assert_eq!(session.storage_key, "_credentials");
    }

    #[test]
    fn test_from_lookup() {
        let options = ClientOptions::from_lookup(lookup(&[
            ("VETDESK_API_URL", "https://api.clinic.test"),
            ("VETDESK_REQUEST_TIMEOUT_SECS", "5"),
            ("VETDESK_STORAGE_DIR", "/tmp/vetdesk"),
        ]))
        .unwrap();
        assert_eq!(options.api_url, "https://api.clinic.test");
        assert_eq!(options.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.storage_dir, Some(PathBuf::from("/tmp/vetdesk")));

        let no_timeout = ClientOptions::from_lookup(lookup(&[
            ("VETDESK_API_URL", "https://api.clinic.test"),
            ("VETDESK_REQUEST_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(no_timeout.request_timeout, None);
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            ClientOptions::from_lookup(lookup(&[])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ClientOptions::from_lookup(lookup(&[
                ("VETDESK_API_URL", "https://api.clinic.test"),
                ("VETDESK_REQUEST_TIMEOUT_SECS", "soon"),
            ])),
            Err(Error::Config(_))
        ));
    }
}
