//! Authorized HTTP calls and status handling shared by the REST clients

use crate::auth::{AuthError, Credentials};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Request timeout for all REST calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a response status is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 404: the resource does not exist
    NotFound,
    /// 409: the resource already exists
    Conflict,
    /// 400 or 403: usually a disabled API or missing permission
    Rejected,
    /// Anything else
    Failed,
}

pub fn classify(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        200..=299 => StatusClass::Success,
        404 => StatusClass::NotFound,
        409 => StatusClass::Conflict,
        400 | 403 => StatusClass::Rejected,
        _ => StatusClass::Failed,
    }
}

/// Remediation hint for a rejected call against `api` (e.g. `datalineage.googleapis.com`)
pub fn remediation_hint(status: u16, api: &str) -> Option<String> {
    match status {
        400 => Some(format!(
            "Bad request: check that {} is enabled and the request is valid for this location",
            api
        )),
        403 => Some(format!(
            "Permission denied: enable the API at https://console.cloud.google.com/apis/library/{} \
             and check the caller's IAM roles",
            api
        )),
        _ => None,
    }
}

/// Transport-level failure of an authorized call
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Transport(String),
}

/// `reqwest` client that attaches a bearer token to every request
///
/// A 401 response invalidates the cached token; the request is rebuilt and
/// sent once more with a fresh one.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: Client,
    credentials: Credentials,
}

impl AuthorizedClient {
    pub fn new(credentials: Credentials) -> Result<Self, HttpError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, credentials })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Send the request produced by `build`
    pub async fn send<F>(&self, build: F) -> Result<Response, HttpError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let token = self.credentials.token().await?;
        let response = build(&self.http)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("Access token rejected (401), refreshing and retrying once");
        self.credentials.invalidate().await;
        let token = self.credentials.token().await?;

        build(&self.http)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))
    }
}

/// Status code and body of an unsuccessful response
pub async fn error_body(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}
