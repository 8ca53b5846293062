//! Aspect payloads attached to catalog entries

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aspect type ids
pub mod ids {
    pub const LOOKER_CORE: &str = "looker-core";
    pub const VIEW_SCHEMA: &str = "looker-view-schema";
    pub const EXPLORE_GRAPH: &str = "looker-explore-graph";
    pub const BQ_DEPENDENCIES: &str = "bq-dependencies";
    pub const DASHBOARD_STRUCTURE: &str = "looker-dashboard-structure";
}

/// Core metadata shared by all Looker entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookerCore {
    pub id: String,
    pub title: String,
    pub url: String,
    pub folder_id: String,
    pub owner: String,
    pub tags: Vec<String>,
}

/// View schema with `name:kind:type` field descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSchema {
    pub model: String,
    pub view: String,
    pub sql_table_name: String,
    pub derived_table_sql: String,
    pub fields: Vec<String>,
}

/// Explore graph: base view, joined views and `name:relationship` joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreGraph {
    pub model: String,
    pub explore: String,
    pub views: Vec<String>,
    pub joins: Vec<String>,
}

/// BigQuery tables and columns an entry depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BqDependencies {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
}

/// Dashboard layout summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStructure {
    pub elements: usize,
    pub explores_used: Vec<String>,
    pub element_types: Vec<String>,
}

/// Aspects to attach to one entry, keyed by aspect type id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectSet {
    aspects: BTreeMap<String, serde_json::Value>,
}

impl AspectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an aspect payload; serialization failures leave the set unchanged
    pub fn insert<T: Serialize>(&mut self, aspect_type_id: &str, payload: &T) -> &mut Self {
        if let Ok(value) = serde_json::to_value(payload) {
            self.aspects.insert(aspect_type_id.to_string(), value);
        }
        self
    }

    pub fn with<T: Serialize>(mut self, aspect_type_id: &str, payload: &T) -> Self {
        self.insert(aspect_type_id, payload);
        self
    }

    pub fn get(&self, aspect_type_id: &str) -> Option<&serde_json::Value> {
        self.aspects.get(aspect_type_id)
    }

    pub fn contains(&self, aspect_type_id: &str) -> bool {
        self.aspects.contains_key(aspect_type_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.aspects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    /// Entry `aspects` document: `{"{project}.{location}.{id}": {"data": payload}}`
    pub fn to_entry_aspects(&self, config: &Config) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .aspects
            .iter()
            .map(|(id, payload)| {
                (
                    config.aspect_key(id),
                    serde_json::json!({ "data": payload }),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
