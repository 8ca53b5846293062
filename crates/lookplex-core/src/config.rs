//! Runtime configuration
//!
//! Built once at process start from the environment, optionally overridden
//! by a local `.env` file, and passed by reference to every component.

use std::path::{Path, PathBuf};

/// Default Dataplex location
pub const DEFAULT_LOCATION: &str = "eu";

/// Default Dataplex entry group for Looker entries
pub const DEFAULT_ENTRY_GROUP: &str = "looker";

/// Default Looker instance id used in FQNs
pub const DEFAULT_LOOKER_INSTANCE: &str = "mylooker";

/// Default BigQuery dataset backing the LookML views
pub const DEFAULT_BQ_DATASET: &str = "retail_banking";

/// Default LookML model (also used as the Looker folder id)
pub const DEFAULT_LOOKER_MODEL: &str = "retail_banking";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// GCP project hosting Dataplex and Data Lineage (`GCP_PROJECT_ID`)
    pub project_id: String,

    /// Dataplex location (`GCP_LOCATION`)
    pub location: String,

    /// Entry group holding Looker entries (`DATAPLEX_ENTRY_GROUP`)
    pub entry_group: String,

    /// Looker instance id (`LOOKER_INSTANCE_ID`)
    pub looker_instance_id: String,

    /// BigQuery dataset (`BQ_DATASET`)
    pub bq_dataset: String,

    /// LookML model name (`LOOKER_MODEL`)
    pub looker_model: String,

    /// Root directory of the LookML project (`LOOKML_DIR`)
    pub lookml_dir: PathBuf,

    /// Relationship file; the bundled tables are used when unset (`RELATIONSHIPS_FILE`)
    pub relationships_file: Option<PathBuf>,

    /// Verbose logging (`DEBUG`)
    pub debug: bool,
}

impl Config {
    /// Load the optional `.env` override file, then read the environment
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        load_env_file(env_file)?;
        Self::from_env()
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let project_id = get("GCP_PROJECT_ID")
            .ok_or_else(|| ConfigError::MissingVar("GCP_PROJECT_ID".to_string()))?;

        Ok(Self {
            project_id,
            location: or_default("GCP_LOCATION", DEFAULT_LOCATION),
            entry_group: or_default("DATAPLEX_ENTRY_GROUP", DEFAULT_ENTRY_GROUP),
            looker_instance_id: or_default("LOOKER_INSTANCE_ID", DEFAULT_LOOKER_INSTANCE),
            bq_dataset: or_default("BQ_DATASET", DEFAULT_BQ_DATASET),
            looker_model: or_default("LOOKER_MODEL", DEFAULT_LOOKER_MODEL),
            lookml_dir: get("LOOKML_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            relationships_file: get("RELATIONSHIPS_FILE").map(PathBuf::from),
            debug: get("DEBUG").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
        })
    }

    /// Override the LookML root directory
    pub fn with_lookml_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lookml_dir = dir.into();
        self
    }

    /// Override the relationship file
    pub fn with_relationships_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.relationships_file = Some(path.into());
        self
    }

    /// `projects/{project}/locations/{location}`
    pub fn location_path(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// `projects/{project}/locations/{location}/entryGroups/{group}`
    pub fn entry_group_path(&self) -> String {
        format!("{}/entryGroups/{}", self.location_path(), self.entry_group)
    }

    /// Key under which an aspect is attached to an entry
    pub fn aspect_key(&self, aspect_type_id: &str) -> String {
        format!("{}.{}.{}", self.project_id, self.location, aspect_type_id)
    }

    /// Full resource name of an aspect type
    pub fn aspect_type_path(&self, aspect_type_id: &str) -> String {
        format!("{}/aspectTypes/{}", self.location_path(), aspect_type_id)
    }

    /// Human-readable configuration summary (no secrets are held here)
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("GCP Project", self.project_id.clone()),
            ("GCP Location", self.location.clone()),
            ("Entry Group", self.entry_group.clone()),
            ("Looker Instance", self.looker_instance_id.clone()),
            ("Looker Model", self.looker_model.clone()),
            ("BigQuery Dataset", self.bq_dataset.clone()),
            ("LookML Directory", self.lookml_dir.display().to_string()),
            (
                "Relationships",
                self.relationships_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "bundled".to_string()),
            ),
            ("Debug", self.debug.to_string()),
        ]
    }
}

/// Load `KEY=value` pairs from `path` into the process environment
///
/// Values in the file override variables already set. Blank lines and
/// `#` comments are skipped. Returns `false` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }

    dotenvy::from_path_override(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(true)
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set. Please set it in your .env file or environment.")]
    MissingVar(String),

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },
}
