//! Catalog backend trait and the requests it accepts

use crate::auth::AuthError;
use crate::http::HttpError;
use lookplex_core::{AspectSet, EntryKind, EntryRef, Fqn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a create call that tolerates existing resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    Created,
    AlreadyExists,
}

/// Entry to create in the Looker entry group
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEntryRequest {
    pub entry: EntryRef,
    pub kind: EntryKind,
    pub fqn: Fqn,
    pub aspects: AspectSet,
}

/// Entry as returned by a list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Full resource name
    pub name: String,

    #[serde(default)]
    pub entry_type: String,

    #[serde(default)]
    pub fully_qualified_name: Option<String>,
}

impl CatalogEntry {
    /// Last segment of the resource name
    pub fn entry_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> Option<EntryKind> {
        EntryKind::from_entry_type(&self.entry_type)
    }
}

/// Relationship carried by an entry link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Uses,
    MapsTo,
    Related,
    Definition,
}

impl LinkKind {
    /// Dataplex entry link type resource
    pub fn link_type(&self) -> &'static str {
        match self {
            LinkKind::Uses | LinkKind::Related => {
                "projects/dataplex-types/locations/global/entryLinkTypes/related"
            }
            LinkKind::MapsTo | LinkKind::Definition => {
                "projects/dataplex-types/locations/global/entryLinkTypes/definition"
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Uses => "uses",
            LinkKind::MapsTo => "maps_to",
            LinkKind::Related => "related",
            LinkKind::Definition => "definition",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link between two entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryLinkRequest {
    pub source: EntryRef,
    pub target: EntryRef,
    pub kind: LinkKind,
}

/// `link-` followed by 8 random hex digits
pub fn generate_link_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("link-{}", &id[..8])
}

/// Aspect type to register
#[derive(Debug, Clone, PartialEq)]
pub struct AspectTypeSpec {
    pub id: String,
    pub description: String,
    /// Dataplex metadata template
    pub template: serde_json::Value,
}

/// Entry type to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTypeSpec {
    pub id: String,
    pub description: String,
    /// Aspect type ids every entry of this type must carry
    pub required_aspects: Vec<String>,
}

/// Dataplex catalog operations
///
/// Existence checks return `Ok(false)` for missing entries; only transport,
/// auth and unexpected status failures are errors. Create calls report an
/// existing resource as [`CreateStatus::AlreadyExists`].
#[async_trait::async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    async fn entry_exists(&self, entry: &EntryRef) -> Result<bool, CatalogError>;

    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<CreateStatus, CatalogError>;

    /// Every entry in `entry_group`
    async fn list_entries(&self, entry_group: &str) -> Result<Vec<CatalogEntry>, CatalogError>;

    async fn create_entry_link(&self, link: &EntryLinkRequest) -> Result<CreateStatus, CatalogError>;

    /// Create the configured entry group
    async fn create_entry_group(&self, description: &str) -> Result<CreateStatus, CatalogError>;

    async fn create_aspect_type(&self, spec: &AspectTypeSpec) -> Result<CreateStatus, CatalogError>;

    async fn create_entry_type(&self, spec: &EntryTypeSpec) -> Result<CreateStatus, CatalogError>;
}

/// Errors from catalog calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
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

    #[error("gcloud command failed: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CatalogError {
    /// Remediation hint attached to 400/403 API errors
    pub fn hint(&self) -> Option<&str> {
        match self {
            CatalogError::Api { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl From<HttpError> for CatalogError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Auth(e) => CatalogError::Auth(e),
            HttpError::Transport(message) => CatalogError::Network(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_types() {
        assert_eq!(LinkKind::Uses.link_type(), LinkKind::Related.link_type());
        assert_eq!(LinkKind::MapsTo.link_type(), LinkKind::Definition.link_type());
        assert!(LinkKind::MapsTo.link_type().ends_with("/definition"));
        assert_eq!(LinkKind::MapsTo.to_string(), "maps_to");
    }

    #[test]
    fn link_ids() {
        let id = generate_link_id();
        assert!(id.starts_with("link-"));
        assert_eq!(id.len(), 13);
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_link_id(), generate_link_id());
    }

    #[test]
    fn listed_entry() {
        let entry: CatalogEntry = serde_json::from_value(serde_json::json!({
            "name": "projects/p/locations/eu/entryGroups/looker/entries/mylooker-retail_banking-card",
            "entryType": "projects/p/locations/eu/entryTypes/looker-view",
            "fullyQualifiedName": "custom:looker.view:mylooker.retail_banking.card"
        }))
        .unwrap();

        assert_eq!(entry.entry_id(), "mylooker-retail_banking-card");
        assert_eq!(entry.kind(), Some(EntryKind::View));
    }
}
