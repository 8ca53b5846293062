//! Declarative relationship tables
//!
//! Which dashboards use which explores, which explores use which views,
//! which views map to which warehouse tables, and the lineage chain to
//! record. Loaded from TOML; the retail-banking tables ship bundled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUNDLED: &str = include_str!("../relationships.toml");

/// Relationship file root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    /// Structural entry links
    #[serde(default)]
    pub links: StructuralLinks,

    /// Lineage chain
    #[serde(default)]
    pub lineage: LineagePlan,
}

/// Parent → children maps used to create entry links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralLinks {
    /// Dashboard name → explore names
    #[serde(default)]
    pub dashboard_explores: BTreeMap<String, Vec<String>>,

    /// Explore name → view names
    #[serde(default)]
    pub explore_views: BTreeMap<String, Vec<String>>,

    /// View name → table (`table`, `dataset.table` or `project.dataset.table`)
    #[serde(default)]
    pub view_tables: BTreeMap<String, String>,
}

/// One BigQuery table feeding one Looker view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub table: String,
    pub view: String,
}

/// Assets searched after lineage is written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAssets {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub views: Vec<String>,
    #[serde(default)]
    pub explores: Vec<String>,
    #[serde(default)]
    pub dashboards: Vec<String>,
}

/// Lineage chain: tables → views → explores → dashboards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineagePlan {
    #[serde(default)]
    pub table_views: Vec<TableView>,

    /// Explore name → view names aggregated into it
    #[serde(default)]
    pub view_explores: BTreeMap<String, Vec<String>>,

    /// Explore name → dashboards visualizing it
    #[serde(default)]
    pub explore_dashboards: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub verify: VerifyAssets,
}

impl Relationships {
    /// The retail-banking tables shipped with the crate
    pub fn bundled() -> Result<Self, RelationshipsError> {
        Self::from_toml(BUNDLED)
    }

    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RelationshipsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelationshipsError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Parse from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, RelationshipsError> {
        toml::from_str(toml).map_err(|e| RelationshipsError::ParseError(e.to_string()))
    }

    /// Load `path` when given, otherwise the bundled tables
    pub fn load(path: Option<&Path>) -> Result<Self, RelationshipsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    /// Number of dashboard → explore pairs
    pub fn dashboard_explore_pairs(&self) -> usize {
        self.links.dashboard_explores.values().map(Vec::len).sum()
    }

    /// Number of explore → view pairs
    pub fn explore_view_pairs(&self) -> usize {
        self.links.explore_views.values().map(Vec::len).sum()
    }
}

/// Relationship file error types
#[derive(Debug, thiserror::Error)]
pub enum RelationshipsError {
    #[error("Failed to read relationships file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse relationships: {0}")]
    ParseError(String),
}
