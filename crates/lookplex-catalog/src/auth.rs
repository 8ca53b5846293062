//! Bearer tokens for Google Cloud REST calls
//!
//! A token is held with its expiry and re-acquired through a
//! [`TokenProvider`] when it expires or when a call comes back 401.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Lifetime assumed for tokens printed by `gcloud auth print-access-token`
pub const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(55 * 60);

/// A bearer token and when it stops being usable
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Source of fresh access tokens
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    async fn fetch_token(&self) -> Result<AccessToken, AuthError>;
}

/// Tokens from the gcloud CLI
pub struct GcloudTokenProvider {
    program: String,
}

impl GcloudTokenProvider {
    pub fn new() -> Self {
        Self {
            program: "gcloud".to_string(),
        }
    }

    /// Use a different gcloud executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for GcloudTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TokenProvider for GcloudTokenProvider {
    fn name(&self) -> &'static str {
        "gcloud"
    }

    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        let output = tokio::process::Command::new(&self.program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| AuthError::CommandFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(AuthError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        Ok(AccessToken::new(token, GCLOUD_TOKEN_TTL))
    }
}

/// A fixed token, for tests and pre-minted credentials
///
/// Counts how many times it was asked for a token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
    ttl: Duration,
    fetches: Arc<AtomicUsize>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ttl: GCLOUD_TOKEN_TTL,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Issue tokens with the given lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Number of tokens issued so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(self.token.clone(), self.ttl))
    }
}

/// Cached token shared by every client built from the same credentials
#[derive(Clone)]
pub struct Credentials {
    provider: Arc<dyn TokenProvider>,
    cached: Arc<Mutex<Option<AccessToken>>>,
}

impl Credentials {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Credentials backed by the gcloud CLI
    pub fn gcloud() -> Self {
        Self::new(Arc::new(GcloudTokenProvider::new()))
    }

    /// Current token, fetching a new one when none is cached or it expired
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        tracing::debug!("Fetching access token from {}", self.provider.name());
        let fresh = self.provider.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// Token acquisition errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to get access token: {0}")]
    CommandFailed(String),

    #[error("Access token command returned an empty token")]
    EmptyToken,
}
