//! Data Lineage resources: processes, runs, events and links
//!
//! Wire shapes follow the Data Lineage v1 REST API (camelCase JSON,
//! RFC 3339 timestamps).

use chrono::{DateTime, Duration, Utc};
use lookplex_core::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Source system recorded on every process
pub const SYSTEM: &str = "looker";

/// Origin name recorded on every process
pub const ORIGIN_NAME: &str = "looker-dataplex-integration";

/// `created_by` attribute on every process
pub const CREATED_BY: &str = "lookplex";

/// What a process transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationType {
    /// BigQuery table → Looker view
    ViewTransformation,
    /// Looker views → explore
    ExploreTransformation,
    /// Explore → dashboard
    DashboardVisualization,
    Other,
}

impl TransformationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewTransformation => "view_transformation",
            Self::ExploreTransformation => "explore_transformation",
            Self::DashboardVisualization => "dashboard_visualization",
            Self::Other => "transform",
        }
    }

    /// Prefix of deterministic process ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::ViewTransformation => "bq-view",
            Self::ExploreTransformation => "view-explore",
            Self::DashboardVisualization => "explore-dash",
            Self::Other => "transform",
        }
    }
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deterministic process id: `{prefix}-{first 8 hex of sha256("display:type")}`
pub fn process_id(display_name: &str, transformation: TransformationType) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", display_name, transformation.as_str()).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", transformation.id_prefix(), &digest[..8])
}

/// Last segment of a resource name
pub fn resource_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub source_type: String,
    pub name: String,
}

/// A lineage process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    /// `projects/{p}/locations/{l}/processes/{id}`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl Process {
    /// Process with a deterministic name derived from `display_name` and `transformation`
    pub fn new(config: &Config, display_name: impl Into<String>, transformation: TransformationType) -> Self {
        let display_name = display_name.into();
        let name = format!(
            "{}/processes/{}",
            config.location_path(),
            process_id(&display_name, transformation)
        );

        let mut attributes = BTreeMap::new();
        attributes.insert("transformation_type".to_string(), Value::from(transformation.as_str()));
        attributes.insert("system".to_string(), Value::from(SYSTEM));
        attributes.insert("created_by".to_string(), Value::from(CREATED_BY));

        Self {
            name,
            display_name,
            attributes,
            origin: Some(Origin {
                source_type: "CUSTOM".to_string(),
                name: ORIGIN_NAME.to_string(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        resource_id(&self.name)
    }

    pub fn transformation_type(&self) -> Option<&str> {
        self.attributes.get("transformation_type").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Started,
    Completed,
    Failed,
    Aborted,
    #[serde(rename = "RUN_STATE_UNSPECIFIED", other)]
    Unspecified,
}

/// One execution of a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// `{process}/runs/{id}`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    pub state: RunState,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Run {
    /// Completed run under `process_name`, ending one second after `start`
    pub fn completed(process_name: &str, display_name: impl Into<String>, start: DateTime<Utc>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("execution_time".to_string(), Value::from(start.to_rfc3339()));
        attributes.insert("status".to_string(), Value::from("success"));

        Self {
            name: format!("{}/runs/run-{}", process_name, start.timestamp()),
            display_name: display_name.into(),
            state: RunState::Completed,
            start_time: start,
            end_time: Some(start + Duration::seconds(1)),
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        resource_id(&self.name)
    }

    /// Name of the owning process
    pub fn process_name(&self) -> &str {
        self.name.split("/runs/").next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub fully_qualified_name: String,
}

impl EntityReference {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: fqn.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLink {
    pub source: EntityReference,
    pub target: EntityReference,
}

/// A source → target edge recorded under a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEvent {
    pub links: Vec<EventLink>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl LineageEvent {
    /// One link, start and end at `at`
    pub fn single(source: &str, target: &str, at: DateTime<Utc>) -> Self {
        Self {
            links: vec![EventLink {
                source: EntityReference::new(source),
                target: EntityReference::new(target),
            }],
            start_time: at,
            end_time: at,
        }
    }
}

/// A link returned by `searchLinks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default)]
    pub name: String,
    pub source: EntityReference,
    pub target: EntityReference,
}

/// Which side of a link the searched asset is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Links where the asset is the source
    Downstream,
    /// Links where the asset is the target
    Upstream,
}

impl LinkDirection {
    /// `searchLinks` request body for `fqn`
    pub fn search_body(&self, fqn: &str) -> Value {
        let reference = EntityReference::new(fqn);
        match self {
            Self::Downstream => serde_json::json!({ "source": reference }),
            Self::Upstream => serde_json::json!({ "target": reference }),
        }
    }

    pub fn matches(&self, link: &Link, fqn: &str) -> bool {
        match self {
            Self::Downstream => link.source.fully_qualified_name == fqn,
            Self::Upstream => link.target.fully_qualified_name == fqn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> Config {
        Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string())).unwrap()
    }

    #[test]
    fn ids_are_deterministic() {
        let a = process_id("BigQuery to Looker View: card", TransformationType::ViewTransformation);
        let b = process_id("BigQuery to Looker View: card", TransformationType::ViewTransformation);
        assert_eq!(a, b);
        assert!(a.starts_with("bq-view-"));
        assert_eq!(a.len(), "bq-view-".len() + 8);
    }

    #[test]
    fn type_changes_id() {
        let view = process_id("x", TransformationType::ViewTransformation);
        let explore = process_id("x", TransformationType::ExploreTransformation);
        assert_ne!(view[view.len() - 8..], explore[explore.len() - 8..]);
        assert!(explore.starts_with("view-explore-"));
        assert!(process_id("x", TransformationType::Other).starts_with("transform-"));
    }

    #[test]
    fn process_json() {
        let process = Process::new(&config(), "Explore to Dashboard: a to b", TransformationType::DashboardVisualization);

        assert!(process.name.starts_with("projects/proj/locations/eu/processes/explore-dash-"));
        assert_eq!(process.transformation_type(), Some("dashboard_visualization"));

        let value = serde_json::to_value(&process).unwrap();
        assert_eq!(value["displayName"], "Explore to Dashboard: a to b");
        assert_eq!(value["attributes"]["system"], "looker");
        assert_eq!(
            value["origin"],
            json!({"sourceType": "CUSTOM", "name": "looker-dataplex-integration"})
        );
    }

    #[test]
    fn completed_run_lasts_one_second() {
        let start = DateTime::parse_from_rfc3339("2024-05-01T10:00:59Z").unwrap().with_timezone(&Utc);
        let run = Run::completed("projects/p/locations/l/processes/x", "Transform card", start);

        assert_eq!(run.state, RunState::Completed);
        assert_eq!(run.end_time.unwrap().to_rfc3339(), "2024-05-01T10:01:00+00:00");
        assert_eq!(run.process_name(), "projects/p/locations/l/processes/x");

        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["state"], "COMPLETED");
        assert_eq!(value["startTime"], "2024-05-01T10:00:59Z");
    }

    #[test]
    fn unknown_run_state() {
        let run: Run = serde_json::from_value(json!({
            "name": "p/runs/r",
            "state": "SOMETHING_NEW",
            "startTime": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(run.state, RunState::Unspecified);
        assert_eq!(run.id(), "r");
    }

    #[test]
    fn event_json() {
        let at = Utc::now();
        let event = LineageEvent::single("bigquery:p.d.t", "custom:looker.view:i.m.t", at);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value["links"],
            json!([{
                "source": {"fullyQualifiedName": "bigquery:p.d.t"},
                "target": {"fullyQualifiedName": "custom:looker.view:i.m.t"}
            }])
        );
        assert_eq!(value["startTime"], value["endTime"]);
    }

    #[test]
    fn search_bodies() {
        assert_eq!(
            LinkDirection::Upstream.search_body("a"),
            json!({"target": {"fullyQualifiedName": "a"}})
        );
        assert_eq!(
            LinkDirection::Downstream.search_body("a"),
            json!({"source": {"fullyQualifiedName": "a"}})
        );
    }
}
