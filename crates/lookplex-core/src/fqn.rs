//! Fully-qualified names and entry references
//!
//! Dataplex identifies catalog entries by FQN strings such as
//! `looker:explore:mylooker.retail_banking.card_transactions`. Entry ids in
//! the entry group are derived from the FQN.

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry group Dataplex uses for BigQuery tables
pub const BIGQUERY_ENTRY_GROUP: &str = "@bigquery";

/// Kind of Looker entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    View,
    Explore,
    Dashboard,
    Look,
}

impl EntryKind {
    /// All kinds, in the order entry types are set up
    pub const ALL: [EntryKind; 4] = [Self::Dashboard, Self::Look, Self::Explore, Self::View];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Explore => "explore",
            Self::Dashboard => "dashboard",
            Self::Look => "look",
        }
    }

    /// Dataplex entry type id
    pub fn entry_type_id(&self) -> &'static str {
        match self {
            Self::View => "looker-view",
            Self::Explore => "looker-explore",
            Self::Dashboard => "looker-dashboard",
            Self::Look => "looker-look",
        }
    }

    /// Classify a Dataplex `entryType` resource name
    pub fn from_entry_type(entry_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| entry_type.rsplit('/').next() == Some(kind.entry_type_id()))
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fqn(String);

impl Fqn {
    /// Wrap an FQN string as-is
    pub fn from_raw(fqn: impl Into<String>) -> Self {
        Self(fqn.into())
    }

    /// `custom:looker.view:{instance}.{model}.{view}`
    pub fn view(instance: &str, model: &str, view: &str) -> Self {
        Self(format!("custom:looker.view:{}.{}.{}", instance, model, view))
    }

    /// `looker:explore:{instance}.{model}.{explore}`
    pub fn explore(instance: &str, model: &str, explore: &str) -> Self {
        Self(format!("looker:explore:{}.{}.{}", instance, model, explore))
    }

    /// `looker:dashboard:{instance}.{folder}.{dashboard}`
    pub fn dashboard(instance: &str, folder: &str, dashboard: &str) -> Self {
        Self(format!("looker:dashboard:{}.{}.{}", instance, folder, dashboard))
    }

    /// `looker:look:{instance}.{folder}.{look}`
    pub fn look(instance: &str, folder: &str, look: &str) -> Self {
        Self(format!("looker:look:{}.{}.{}", instance, folder, look))
    }

    /// FQN of a Looker entity using the configured instance and model
    pub fn looker(config: &Config, kind: EntryKind, name: &str) -> Self {
        let instance = &config.looker_instance_id;
        let model = &config.looker_model;
        match kind {
            EntryKind::View => Self::view(instance, model, name),
            EntryKind::Explore => Self::explore(instance, model, name),
            EntryKind::Dashboard => Self::dashboard(instance, model, name),
            EntryKind::Look => Self::look(instance, model, name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local entry id: text after the last `:` with dots replaced by dashes
    pub fn entry_id(&self) -> String {
        let local = self.0.rsplit(':').next().unwrap_or(&self.0);
        local.replace('.', "-")
    }

    /// Last dotted component (the entity name for Looker FQNs)
    pub fn short_name(&self) -> &str {
        self.0.rsplit(['.', ':', '/']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to an entry inside an entry group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryRef {
    pub entry_group: String,
    pub entry_id: String,
}

impl EntryRef {
    pub fn new(entry_group: impl Into<String>, entry_id: impl Into<String>) -> Self {
        Self {
            entry_group: entry_group.into(),
            entry_id: entry_id.into(),
        }
    }

    /// Entry in the configured Looker entry group
    pub fn looker(config: &Config, entry_id: impl Into<String>) -> Self {
        Self::new(config.entry_group.clone(), entry_id)
    }

    /// `projects/{p}/locations/{l}/entryGroups/{g}/entries/{id}`
    pub fn resource_name(&self, config: &Config) -> String {
        format!(
            "{}/entryGroups/{}/entries/{}",
            config.location_path(),
            self.entry_group,
            self.entry_id
        )
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entry_group, self.entry_id)
    }
}

/// A BigQuery table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BigQueryTable {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl BigQueryTable {
    pub fn new(project: impl Into<String>, dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Resolve `table`, `dataset.table` or `project.dataset.table`
    ///
    /// Missing parts come from the configured project and dataset. Returns
    /// `None` when a part is empty or contains characters that cannot
    /// appear in a table path (templated names like `${x.SQL_TABLE_NAME}`).
    pub fn resolve(reference: &str, config: &Config) -> Option<Self> {
        let parts: Vec<&str> = reference.trim().split('.').collect();
        if !parts.iter().all(|p| is_identifier(p)) {
            return None;
        }

        match parts.as_slice() {
            [table] => Some(Self::new(&config.project_id, &config.bq_dataset, *table)),
            [dataset, table] => Some(Self::new(&config.project_id, *dataset, *table)),
            [project, dataset, table] => Some(Self::new(*project, *dataset, *table)),
            _ => None,
        }
    }

    /// `bigquery:{project}.{dataset}.{table}`
    pub fn fqn(&self) -> Fqn {
        Fqn(format!("bigquery:{}.{}.{}", self.project, self.dataset, self.table))
    }

    /// Entry Dataplex maintains for this table in the `@bigquery` group
    pub fn entry_ref(&self) -> EntryRef {
        EntryRef::new(
            BIGQUERY_ENTRY_GROUP,
            format!(
                "bigquery.googleapis.com/projects/{}/datasets/{}/tables/{}",
                self.project, self.dataset, self.table
            ),
        )
    }
}

impl fmt::Display for BigQueryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

fn is_identifier(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
