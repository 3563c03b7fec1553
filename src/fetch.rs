//! Request builder for the clinic API
//!
//! Authenticated requests go through [`SessionManager::fetch_with_auth`], so
//! they carry the bearer token and get the single refresh-and-retry on 401.
//! Responses are decoded from the `{ data, error, status, message }` envelope.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;
use vetdesk_auth::{ApiResponse, SessionManager};

use crate::error::Error;

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    session: &'a SessionManager,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Option<HashMap<String, String>>,
    body: Option<Vec<u8>>,
    authenticated: bool,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder for `path` below the session's base URL
    pub fn new(session: &'a SessionManager, path: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            session,
            url: format!("{}{}", session.base_url(), path),
            method,
            headers,
            query_params: None,
            body: None,
            authenticated: true,
        }
    }

    /// Add a single query parameter
    pub fn query_param(mut self, key: &str, value: &str) -> Self {
        self.query_params
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// Send without the session's bearer token
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Build the request
    fn build(&self) -> Result<Request, Error> {
        let mut url = Url::parse(&self.url)?;

        if let Some(params) = &self.query_params {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self
            .session
            .http_client()
            .request(self.method.clone(), url)
            .headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req.build()?)
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(&self) -> Result<Response, Error> {
        let request = self.build()?;
        debug!(method = %request.method(), url = %request.url(), authenticated = self.authenticated, "sending request");

        if self.authenticated {
            Ok(self.session.fetch_with_auth(request).await?)
        } else {
            Ok(self.session.http_client().execute(request).await?)
        }
    }

    /// Execute the request; the envelope's `data` may be absent
    pub async fn execute_optional<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        let response = self.execute_raw().await?;
        decode_envelope(response).await
    }

    /// Execute the request and return the envelope's `data`
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self.execute_raw().await?;
        let status = response.status().as_u16();
        decode_envelope(response)
            .await?
            .ok_or_else(|| Error::api(status, "response carried no data"))
    }
}

/// Normalize a response into `data` or an error
///
/// A non-2xx status, an `error` field or `status: "error"` is a failure.
pub async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, Error> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| {
                let message = envelope.message.clone();
                envelope.into_result().err().map(|error| error.message()).or(message)
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body.clone()
                }
            });
        return Err(Error::api(status.as_u16(), message));
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
    envelope
        .into_result()
        .map_err(|error| Error::api(status.as_u16(), error.message()))
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(session: &'a SessionManager, path: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(session, path, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(session: &'a SessionManager, path: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(session, path, Method::POST)
    }

    /// Create a PATCH request
    pub fn patch<'a>(session: &'a SessionManager, path: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(session, path, Method::PATCH)
    }

    /// Create a DELETE request
    pub fn delete<'a>(session: &'a SessionManager, path: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(session, path, Method::DELETE)
    }
}
