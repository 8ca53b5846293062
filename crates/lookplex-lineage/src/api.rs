//! Lineage API abstraction
//!
//! [`LineageApi`] is implemented by the REST client and by the in-memory
//! mock. Resource arguments are full resource names
//! (`projects/{p}/locations/{l}/processes/{id}[/runs/{id}]`).

use crate::model::{LineageEvent, Link, LinkDirection, Process, Run};
use lookplex_catalog::{AuthError, HttpError};

#[async_trait::async_trait]
pub trait LineageApi: Send + Sync {
    /// Name of the implementation (for logging)
    fn name(&self) -> &'static str;

    /// `None` when the process does not exist
    async fn get_process(&self, name: &str) -> Result<Option<Process>, LineageError>;

    /// Create a process; returns the stored resource
    async fn create_process(&self, process: &Process) -> Result<Process, LineageError>;

    /// Every process in the location
    async fn list_processes(&self) -> Result<Vec<Process>, LineageError>;

    /// Delete a process with its runs and events. Deleting a missing process succeeds.
    async fn delete_process(&self, name: &str) -> Result<(), LineageError>;

    async fn get_run(&self, name: &str) -> Result<Option<Run>, LineageError>;

    /// Create a run under `process_name`
    async fn create_run(&self, process_name: &str, run: &Run) -> Result<Run, LineageError>;

    async fn list_runs(&self, process_name: &str) -> Result<Vec<Run>, LineageError>;

    /// Record an event under `run_name`
    async fn create_event(&self, run_name: &str, event: &LineageEvent) -> Result<(), LineageError>;

    /// Links with `fqn` on the side given by `direction`
    async fn search_links(&self, fqn: &str, direction: LinkDirection) -> Result<Vec<Link>, LineageError>;
}

/// Errors from lineage calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum LineageError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        hint: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LineageError {
    /// Remediation hint attached to 400/403 API errors
    pub fn hint(&self) -> Option<&str> {
        match self {
            LineageError::Api { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl From<HttpError> for LineageError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Auth(e) => LineageError::Auth(e),
            HttpError::Transport(message) => LineageError::Network(message),
        }
    }
}
