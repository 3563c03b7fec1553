//! VetDesk Rust Client Library
//!
//! A Rust client for the VetDesk veterinary clinic API: staff sessions,
//! pets, reservations, staff members and user accounts. Sessions and token
//! refresh live in [`vetdesk_auth`], reservation dates and slots in
//! [`vetdesk_schedule`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod pets;
pub mod reservations;
pub mod staff;
pub mod users;
mod validation;

use std::sync::Arc;

use reqwest::Client;
use tracing::info;
use url::Url;
use vetdesk_auth::{FileStore, KeyValueStore, MemoryStore, SessionManager, SystemClock};

pub use vetdesk_auth as auth;
pub use vetdesk_schedule as schedule;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::pets::PetsClient;
use crate::reservations::ReservationsClient;
use crate::staff::StaffClient;
use crate::users::UsersClient;

/// The main entry point for the VetDesk client
pub struct VetDesk {
    /// Base URL of the clinic API
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Session shared by every resource client
    pub session: Arc<SessionManager>,
    /// Client options
    pub options: ClientOptions,
}

impl VetDesk {
    /// Create a new VetDesk client with default options
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the clinic API
    ///
    /// # Example
    ///
    /// ```
    /// use vetdesk::VetDesk;
    ///
    /// let vetdesk = VetDesk::new("https://api.clinic.example").unwrap();
    /// ```
    pub fn new(api_url: &str) -> Result<Self, Error> {
        Self::new_with_options(ClientOptions::new(api_url))
    }

    /// Create a new VetDesk client with custom options
    ///
    /// Credentials are kept in memory, or under `options.storage_dir` when it
    /// is set, and restored from there on the next start.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use vetdesk::{VetDesk, config::ClientOptions};
    ///
    /// let options = ClientOptions::new("https://api.clinic.example")
    ///     .with_request_timeout(Some(Duration::from_secs(10)));
    /// let vetdesk = VetDesk::new_with_options(options).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Result<Self, Error> {
        Url::parse(&options.api_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let store: Arc<dyn KeyValueStore> = match &options.storage_dir {
            Some(dir) => Arc::new(FileStore::new(dir)?),
            None => Arc::new(MemoryStore::new()),
        };

        let session = SessionManager::new(
            &options.api_url,
            http_client.clone(),
            options.session_options(),
            store,
            Arc::new(SystemClock),
        );

        Ok(Self::with_session(options, Arc::new(session)))
    }

    /// Create a client from `VETDESK_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::new_with_options(ClientOptions::from_env()?)
    }

    /// Create a client around an existing session manager
    ///
    /// Useful to share one session between several clients, or to plug in a
    /// custom store or clock.
    pub fn with_session(options: ClientOptions, session: Arc<SessionManager>) -> Self {
        info!(url = %session.base_url(), "vetdesk client ready");
        Self {
            url: session.base_url().to_string(),
            http_client: session.http_client().clone(),
            session,
            options,
        }
    }

    /// Get a reference to the session manager for login, logout and tokens
    pub fn auth(&self) -> &SessionManager {
        &self.session
    }

    /// The shared session manager
    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    /// Client for pet records
    pub fn pets(&self) -> PetsClient {
        PetsClient::new(self.session())
    }

    /// Client for reservations, checked against the configured slot grid
    ///
    /// # Example
    ///
    /// ```
    /// use vetdesk::VetDesk;
    ///
    /// let vetdesk = VetDesk::new("https://api.clinic.example").unwrap();
    /// assert_eq!(vetdesk.reservations().grid().len(), 18);
    /// ```
    pub fn reservations(&self) -> ReservationsClient {
        ReservationsClient::new(self.session(), self.options.slot_grid)
    }

    /// Client for staff members
    pub fn staff(&self) -> StaffClient {
        StaffClient::new(self.session())
    }

    /// Client for user accounts
    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.session())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::VetDesk;
    pub use vetdesk_auth::{AuthError, AuthState, SessionManager, UserProfile};
    pub use vetdesk_schedule::{
        canonical_slots, parse_time_slot, ReservationDate, ReservationStatus, SlotGrid, TimeSlot,
    };
}
