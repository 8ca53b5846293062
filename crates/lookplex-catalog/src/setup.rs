//! One-time catalog setup: entry group, aspect types, entry types

use crate::backend::{AspectTypeSpec, CatalogBackend, CreateStatus, EntryTypeSpec};
use lookplex_core::aspect::ids;
use lookplex_core::{BatchSummary, EntryKind};
use serde_json::{json, Value};

pub const ENTRY_GROUP_DESCRIPTION: &str =
    "Looker metadata entries following Dataplex FQN specifications";

fn field(name: &str, kind: &str, index: usize) -> Value {
    json!({ "name": name, "type": kind, "index": index })
}

fn string_array(name: &str, index: usize) -> Value {
    json!({
        "name": name,
        "type": "array",
        "index": index,
        "arrayItems": { "name": format!("{}_item", name), "type": "string" }
    })
}

fn record(name: &str, fields: Vec<Value>) -> Value {
    json!({ "name": name, "type": "record", "recordFields": fields })
}

/// The five aspect types attached to Looker entries
pub fn aspect_type_specs() -> Vec<AspectTypeSpec> {
    vec![
        AspectTypeSpec {
            id: ids::LOOKER_CORE.to_string(),
            description: "Core metadata for all Looker entries".to_string(),
            template: record(
                "LookerCore",
                vec![
                    field("id", "string", 1),
                    field("title", "string", 2),
                    field("url", "string", 3),
                    field("folderId", "string", 4),
                    field("owner", "string", 5),
                    string_array("tags", 6),
                ],
            ),
        },
        AspectTypeSpec {
            id: ids::VIEW_SCHEMA.to_string(),
            description: "View schema with field definitions and dependencies".to_string(),
            template: record(
                "LookerViewSchema",
                vec![
                    field("model", "string", 1),
                    field("view", "string", 2),
                    field("sql_table_name", "string", 3),
                    field("derived_table_sql", "string", 4),
                    string_array("fields", 5),
                ],
            ),
        },
        AspectTypeSpec {
            id: ids::EXPLORE_GRAPH.to_string(),
            description: "Explore graph metadata with views and joins".to_string(),
            template: record(
                "LookerExploreGraph",
                vec![
                    field("model", "string", 1),
                    field("explore", "string", 2),
                    string_array("views", 3),
                    string_array("joins", 4),
                ],
            ),
        },
        AspectTypeSpec {
            id: ids::BQ_DEPENDENCIES.to_string(),
            description: "BigQuery table and column dependencies".to_string(),
            template: record(
                "BqDependencies",
                vec![string_array("tables", 1), string_array("columns", 2)],
            ),
        },
        AspectTypeSpec {
            id: ids::DASHBOARD_STRUCTURE.to_string(),
            description: "Dashboard elements and the explores they query".to_string(),
            template: record(
                "LookerDashboardStructure",
                vec![
                    field("elements", "int", 1),
                    string_array("explores_used", 2),
                    string_array("element_types", 3),
                ],
            ),
        },
    ]
}

/// Entry type for each Looker entry kind, with its required aspects
pub fn entry_type_spec(kind: EntryKind) -> EntryTypeSpec {
    let (description, required): (&str, &[&str]) = match kind {
        EntryKind::Dashboard => (
            "Looker dashboard with tiles and explore dependencies",
            &[ids::LOOKER_CORE][..],
        ),
        EntryKind::Look => ("Looker saved look with query definition", &[ids::LOOKER_CORE][..]),
        EntryKind::Explore => (
            "Looker explore semantic query surface",
            &[ids::LOOKER_CORE, ids::EXPLORE_GRAPH][..],
        ),
        EntryKind::View => (
            "LookML view mapping to warehouse table or derived SQL",
            &[ids::LOOKER_CORE, ids::VIEW_SCHEMA][..],
        ),
    };

    EntryTypeSpec {
        id: kind.entry_type_id().to_string(),
        description: description.to_string(),
        required_aspects: required.iter().map(|id| id.to_string()).collect(),
    }
}

pub fn entry_type_specs() -> Vec<EntryTypeSpec> {
    EntryKind::ALL.into_iter().map(entry_type_spec).collect()
}

fn record_outcome(batch: &mut BatchSummary, what: &str, result: Result<CreateStatus, crate::CatalogError>) {
    match result {
        Ok(CreateStatus::Created) => {
            tracing::info!("Created {}", what);
            batch.record_success();
        }
        Ok(CreateStatus::AlreadyExists) => {
            tracing::info!("{} already exists", what);
            batch.record_success();
        }
        Err(e) => {
            tracing::error!("Failed to create {}: {}", what, e);
            if let Some(hint) = e.hint() {
                tracing::warn!("{}", hint);
            }
            batch.record_failure();
        }
    }
}

/// Runs the setup steps against a backend
pub struct CatalogSetup<'a> {
    backend: &'a dyn CatalogBackend,
}

impl<'a> CatalogSetup<'a> {
    pub fn new(backend: &'a dyn CatalogBackend) -> Self {
        Self { backend }
    }

    pub async fn create_entry_group(&self) -> BatchSummary {
        let mut batch = BatchSummary::new("entry group");
        let result = self.backend.create_entry_group(ENTRY_GROUP_DESCRIPTION).await;
        record_outcome(&mut batch, "entry group", result);
        batch
    }

    pub async fn create_aspect_types(&self) -> BatchSummary {
        let mut batch = BatchSummary::new("aspect types");
        for spec in aspect_type_specs() {
            let result = self.backend.create_aspect_type(&spec).await;
            record_outcome(&mut batch, &format!("aspect type {}", spec.id), result);
        }
        batch
    }

    pub async fn create_entry_types(&self) -> BatchSummary {
        let mut batch = BatchSummary::new("entry types");
        for spec in entry_type_specs() {
            let result = self.backend.create_entry_type(&spec).await;
            record_outcome(&mut batch, &format!("entry type {}", spec.id), result);
        }
        batch
    }

    /// Entry group, then aspect types, then entry types
    pub async fn run_all(&self) -> Vec<BatchSummary> {
        vec![
            self.create_entry_group().await,
            self.create_aspect_types().await,
            self.create_entry_types().await,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_aspect_types() {
        let specs = aspect_type_specs();
        let ids: Vec<_> = specs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "looker-core",
                "looker-view-schema",
                "looker-explore-graph",
                "bq-dependencies",
                "looker-dashboard-structure"
            ]
        );

        let core = &specs[0].template;
        assert_eq!(core["type"], "record");
        assert_eq!(core["recordFields"][5]["arrayItems"]["type"], "string");
    }

    #[test]
    fn required_aspects_per_kind() {
        assert_eq!(entry_type_spec(EntryKind::Dashboard).required_aspects, vec!["looker-core"]);
        assert_eq!(
            entry_type_spec(EntryKind::View).required_aspects,
            vec!["looker-core", "looker-view-schema"]
        );
        assert_eq!(entry_type_specs().len(), 4);
        assert_eq!(entry_type_specs()[0].id, "looker-dashboard");
    }
}
