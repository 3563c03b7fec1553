//! Session management: credential lifecycle, token refresh and authenticated requests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Request, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::envelope::{ApiResponse, ErrorInfo};
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::{AuthHeader, AuthState, Credentials, UserProfile};
use crate::{AuthError, SessionOptions};

/// Body of the login, signup and refresh endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    #[serde(alias = "user")]
    data: Option<UserProfile>,
    status: Option<String>,
    message: Option<String>,
    error: Option<ErrorInfo>,
}

impl TokenResponse {
    fn failure_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(self.message.clone().unwrap_or_else(|| error.message()));
        }
        if self.status.as_deref() == Some("error") {
            return Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "request rejected".to_string()),
            );
        }
        None
    }
}

/// Credentials together with the session epoch they belong to.
///
/// The epoch moves on every login, signup and clear; a refresh that started
/// under an older epoch must not write its result.
#[derive(Debug, Default)]
struct SessionRecord {
    credentials: Credentials,
    epoch: u64,
}

/// Result of a finished refresh, kept so that callers who waited on it can
/// share it instead of hitting the network again.
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed,
    NoSession,
    Rejected(String),
    Unavailable(String),
}

impl RefreshOutcome {
    fn of(result: &Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => Self::Refreshed,
            Err(AuthError::NotAuthenticated) => Self::NoSession,
            Err(AuthError::RefreshFailed(message)) => Self::Rejected(message.clone()),
            Err(other) => Self::Unavailable(other.to_string()),
        }
    }

    fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Refreshed => Ok(()),
            Self::NoSession => Err(AuthError::NotAuthenticated),
            Self::Rejected(message) => Err(AuthError::RefreshFailed(message)),
            Self::Unavailable(message) => Err(AuthError::RefreshUnavailable(message)),
        }
    }
}

/// Single source of truth for "is the caller authenticated" and "which bearer
/// token to attach".
///
/// Build one per application and share it behind an `Arc`.
///
/// ```text
/// Anonymous ──login/signup──→ Fresh ──ttl elapses──→ Expired
///     ↑                         ↑                       │
///     │                         └──── refresh ok ───────┤
///     └──── logout / refresh 401 / retry 401 ───────────┘
/// ```
pub struct SessionManager {
    base_url: String,
    http_client: Client,
    options: SessionOptions,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    record: RwLock<SessionRecord>,
    refresh_gate: Mutex<Option<RefreshOutcome>>,
    completed_refreshes: AtomicU64,
}

impl SessionManager {
    /// Create a session manager, restoring any credentials persisted under
    /// `options.storage_key`.
    pub fn new(
        base_url: &str,
        http_client: Client,
        options: SessionOptions,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let credentials = if options.persist_session {
            load_credentials(store.as_ref(), &options.storage_key)
        } else {
            Credentials::default()
        };

        if credentials.access_token.is_some() {
            info!(
                expired = credentials.is_expired_at(clock.now()),
                "restored persisted session"
            );
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            options,
            store,
            clock,
            record: RwLock::new(SessionRecord {
                credentials,
                epoch: 0,
            }),
            refresh_gate: Mutex::new(None),
            completed_refreshes: AtomicU64::new(0),
        }
    }

    /// In-memory store, wall clock, default options.
    pub fn with_defaults(base_url: &str, http_client: Client) -> Self {
        Self::new(
            base_url,
            http_client,
            SessionOptions::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read_record(&self) -> RwLockReadGuard<'_, SessionRecord> {
        self.record.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_record(&self) -> RwLockWriteGuard<'_, SessionRecord> {
        self.record.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        let ttl = Duration::from_std(self.options.access_token_ttl)
            .unwrap_or_else(|_| Duration::minutes(15));
        self.clock.now() + ttl
    }

    fn persist(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if !self.options.persist_session {
            return Ok(());
        }
        let value = serde_json::to_string(credentials)?;
        self.store.set(&self.options.storage_key, &value)
    }

    /// Persist a record that is already live in memory.
    fn persist_live(&self, credentials: &Credentials) {
        if let Err(err) = self.persist(credentials) {
            warn!(error = %err, "failed to persist credentials");
        }
    }

    /// Replace the whole record with a new session and start a new epoch.
    ///
    /// The record is written to the store first; if that fails the previous
    /// record stays in place.
    fn start_session(&self, credentials: Credentials) -> Result<(), AuthError> {
        let mut record = self.write_record();
        self.persist(&credentials)?;
        record.epoch += 1;
        record.credentials = credentials;
        Ok(())
    }

    /// Drop every credential and start a new epoch.
    fn clear(&self, reason: &str) {
        let mut record = self.write_record();
        self.reset(&mut record, reason);
    }

    /// Clear only if no other session has started since `epoch`.
    fn clear_epoch(&self, epoch: u64, reason: &str) {
        let mut record = self.write_record();
        if record.epoch == epoch {
            self.reset(&mut record, reason);
        } else {
            debug!(reason, "session already replaced, nothing to clear");
        }
    }

    fn reset(&self, record: &mut SessionRecord, reason: &str) {
        record.epoch += 1;
        record.credentials = Credentials::default();
        if self.options.persist_session {
            if let Err(err) = self.store.remove(&self.options.storage_key) {
                warn!(error = %err, "failed to remove persisted credentials");
            }
        }
        info!(reason, "session cleared");
    }

    /// Snapshot of the current credential record.
    pub fn credentials(&self) -> Credentials {
        self.read_record().credentials.clone()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read_record().credentials.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_record().credentials.access_token.is_some()
    }

    /// True if no expiry is recorded or the clock is past it.
    pub fn is_expired(&self) -> bool {
        self.read_record()
            .credentials
            .is_expired_at(self.clock.now())
    }

    pub fn state(&self) -> AuthState {
        let record = self.read_record();
        if record.credentials.access_token.is_none() {
            AuthState::Anonymous
        } else if record.credentials.is_expired_at(self.clock.now()) {
            AuthState::Expired
        } else {
            AuthState::Fresh
        }
    }

    /// Log in with email and password.
    ///
    /// On failure the stored credentials are left as they were.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        self.establish("/auth/login", payload).await
    }

    /// Register a new account and log it in.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let payload = serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        });
        self.establish("/auth/signup", payload).await
    }

    async fn establish(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<UserProfile, AuthError> {
        let response = self
            .http_client
            .post(self.endpoint(path))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<TokenResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|tokens| tokens.failure_message())
                .unwrap_or_else(|| fallback_message(status, &body));
            if is_rejection(status) {
                return Err(AuthError::InvalidCredentials(message));
            }
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let tokens = parsed?;
        if let Some(message) = tokens.failure_message() {
            return Err(AuthError::InvalidCredentials(message));
        }
        let access_token = tokens.access_token.ok_or_else(|| AuthError::ApiError {
            status: status.as_u16(),
            message: "response carried no access token".to_string(),
        })?;
        let user = tokens.data.ok_or_else(|| AuthError::ApiError {
            status: status.as_u16(),
            message: "response carried no user profile".to_string(),
        })?;

        self.start_session(Credentials {
            access_token: Some(access_token),
            refresh_token: tokens.refresh_token,
            user: Some(user.clone()),
            expires_at: Some(self.expiry_from_now()),
        })?;
        info!(user_id = user.id, path, "session established");

        Ok(user)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// At most one refresh is on the wire at a time. A caller that arrives
    /// while another refresh is running waits for it and gets its outcome.
    ///
    /// Without a refresh token this fails with `NotAuthenticated` and makes no
    /// request. A 401 clears the session and fails with `RefreshFailed`. Any
    /// other failure leaves the session untouched.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let observed = self.completed_refreshes.load(Ordering::Acquire);
        let mut last = self.refresh_gate.lock().await;

        if self.completed_refreshes.load(Ordering::Acquire) != observed {
            if let Some(outcome) = last.clone() {
                debug!("joined a refresh that finished while waiting");
                return outcome.into_result();
            }
        }

        let result = self.perform_refresh().await;
        *last = Some(RefreshOutcome::of(&result));
        self.completed_refreshes.fetch_add(1, Ordering::Release);
        result
    }

    async fn perform_refresh(&self) -> Result<(), AuthError> {
        let (refresh_token, epoch) = {
            let record = self.read_record();
            match &record.credentials.refresh_token {
                Some(token) => (token.clone(), record.epoch),
                None => return Err(AuthError::NotAuthenticated),
            }
        };

        debug!("refreshing access token");
        let response = self
            .http_client
            .post(self.endpoint("/auth/refresh"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!("refresh token rejected, ending session");
            self.clear_epoch(epoch, "refresh token rejected");
            return Err(AuthError::RefreshFailed(fallback_message(status, &body)));
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message: fallback_message(status, &body),
            });
        }

        let tokens: TokenResponse = response.json().await?;
        if let Some(message) = tokens.failure_message() {
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        let access_token = tokens.access_token.ok_or_else(|| AuthError::ApiError {
            status: status.as_u16(),
            message: "refresh response carried no access token".to_string(),
        })?;

        let mut record = self.write_record();
        if record.epoch != epoch {
            debug!("discarding refresh result of an ended session");
            return Err(AuthError::NotAuthenticated);
        }

        let mut next = record.credentials.clone();
        next.access_token = Some(access_token);
        if let Some(rotated) = tokens.refresh_token {
            next.refresh_token = Some(rotated);
        }
        if let Some(user) = tokens.data {
            next.user = Some(user);
        }
        next.expires_at = Some(self.expiry_from_now());
        record.credentials = next;
        self.persist_live(&record.credentials);
        info!("access token refreshed");

        Ok(())
    }

    /// Header for an outbound request, refreshing first if the token expired.
    ///
    /// Never hands out an expired token: if the refresh fails the error is
    /// returned instead.
    pub async fn auth_header(&self) -> Result<AuthHeader, AuthError> {
        let (token, _) = self.current_token().await?;
        Ok(AuthHeader::bearer(&token))
    }

    /// Usable access token together with the epoch it belongs to.
    async fn current_token(&self) -> Result<(String, u64), AuthError> {
        if self.is_expired() {
            if !self.options.auto_refresh_token || !self.is_authenticated() {
                return Err(AuthError::NotAuthenticated);
            }
            self.refresh().await?;
        }

        let record = self.read_record();
        match &record.credentials.access_token {
            Some(token) => Ok((token.clone(), record.epoch)),
            None => Err(AuthError::NotAuthenticated),
        }
    }

    /// End this session on the server and locally.
    ///
    /// Local credentials are cleared before the request goes out, so the
    /// client never looks authenticated afterwards even when the request
    /// fails. The request error, if any, is still returned.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.end_session("/auth/protected/logout", true).await
    }

    /// End every session of the user on the server, and this one locally.
    pub async fn logout_all(&self) -> Result<(), AuthError> {
        self.end_session("/auth/protected/logout-all", false).await
    }

    async fn end_session(&self, path: &str, send_refresh_token: bool) -> Result<(), AuthError> {
        let credentials = self.credentials();
        self.clear("logout");

        let Some(access_token) = credentials.access_token else {
            return Ok(());
        };

        let mut request = self
            .http_client
            .post(self.endpoint(path))
            .bearer_auth(access_token);
        if send_refresh_token {
            request = request.header(
                "x-refresh-token",
                credentials.refresh_token.unwrap_or_default(),
            );
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, path, "server-side logout rejected");
                Err(AuthError::ApiError {
                    status: status.as_u16(),
                    message: fallback_message(status, &body),
                })
            }
            Err(err) => {
                warn!(error = %err, path, "server-side logout failed");
                Err(AuthError::NetworkError(err))
            }
        }
    }

    /// Send `request` with the current bearer token.
    ///
    /// A 401 triggers exactly one refresh and one retry. If the refresh fails
    /// or the retry is answered with 401 too, the session is cleared and
    /// `NotAuthenticated` is returned. When another request already replaced
    /// the token that got the 401, the retry goes out without a refresh.
    ///
    /// Only the session the request was sent under is ever cleared; if a new
    /// login happened meanwhile it is left alone and the request fails with
    /// `NotAuthenticated`.
    pub async fn fetch_with_auth(&self, request: Request) -> Result<Response, AuthError> {
        let retry = request.try_clone().ok_or(AuthError::UnreplayableRequest)?;

        let (response, sent_token, epoch) = self.send_authorized(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let (current_token, current_epoch) = {
            let record = self.read_record();
            (record.credentials.access_token.clone(), record.epoch)
        };
        if current_epoch != epoch {
            debug!("session replaced while the request was in flight");
            return Err(AuthError::NotAuthenticated);
        }

        if current_token.as_deref() == Some(sent_token.as_str()) {
            info!(url = %retry.url(), "request unauthorized, refreshing before one retry");
            if let Err(err) = self.refresh().await {
                debug!(error = %err, "refresh before retry failed");
                self.clear_epoch(epoch, "refresh before retry failed");
                return Err(AuthError::NotAuthenticated);
            }
        } else {
            debug!(url = %retry.url(), "token replaced since the request went out, retrying");
        }

        let (response, _, retry_epoch) = self.send_authorized(retry).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.clear_epoch(retry_epoch, "retry unauthorized");
            return Err(AuthError::NotAuthenticated);
        }
        Ok(response)
    }

    async fn send_authorized(
        &self,
        mut request: Request,
    ) -> Result<(Response, String, u64), AuthError> {
        let (token, epoch) = self.current_token().await?;
        let header = AuthHeader::bearer(&token);
        request
            .headers_mut()
            .insert(AUTHORIZATION, header.to_header_value()?);
        let response = self.http_client.execute(request).await?;
        Ok((response, token, epoch))
    }

    /// Re-fetch the profile from `GET /user/me` and cache it.
    pub async fn fetch_current_user(&self) -> Result<UserProfile, AuthError> {
        let epoch = self.read_record().epoch;
        let request = self.http_client.get(self.endpoint("/user/me")).build()?;
        let response = self.fetch_with_auth(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message: fallback_message(status, &body),
            });
        }

        let envelope: ApiResponse<UserProfile> = response.json().await?;
        let user = envelope
            .into_result()
            .map_err(|error| AuthError::ApiError {
                status: status.as_u16(),
                message: error.message(),
            })?
            .ok_or_else(|| AuthError::ApiError {
                status: status.as_u16(),
                message: "response carried no user profile".to_string(),
            })?;

        let mut record = self.write_record();
        if record.epoch == epoch {
            let mut next = record.credentials.clone();
            next.user = Some(user.clone());
            record.credentials = next;
            self.persist_live(&record.credentials);
        }

        Ok(user)
    }
}

fn load_credentials(store: &dyn KeyValueStore, key: &str) -> Credentials {
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Credentials>(&raw) {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(error = %err, "discarding unreadable persisted credentials");
                if let Err(err) = store.remove(key) {
                    warn!(error = %err, "failed to remove unreadable credentials");
                }
                Credentials::default()
            }
        },
        Ok(None) => Credentials::default(),
        Err(err) => {
            warn!(error = %err, "failed to load persisted credentials");
            Credentials::default()
        }
    }
}

/// Statuses that mean the submitted credentials were refused.
fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::UNPROCESSABLE_ENTITY
    )
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        if let Err(error) = envelope.into_result() {
            return error.message();
        }
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
