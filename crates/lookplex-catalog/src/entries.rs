//! Catalog entries built from extracted LookML

use lookplex_core::aspect::ids;
use lookplex_core::{
    AspectSet, BigQueryTable, BqDependencies, Config, DashboardStructure, EntryKind, ExploreGraph,
    Fqn, LookerCore, ViewSchema,
};
use lookplex_lookml::{Dashboard, ExploreMetadata, ViewMetadata};
use std::collections::BTreeMap;

/// Owner recorded in the core aspect
pub const OWNER: &str = "system";

/// An entry to ensure in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySpec {
    pub fqn: Fqn,
    pub kind: EntryKind,
    pub aspects: AspectSet,
}

impl EntrySpec {
    pub fn entry_id(&self) -> String {
        self.fqn.entry_id()
    }
}

fn looker_url(config: &Config, path: &str) -> String {
    format!("https://{}.looker.com/{}", config.looker_instance_id, path)
}

fn core(config: &Config, name: &str, title: Option<&str>, url: String, tags: [&str; 2]) -> LookerCore {
    LookerCore {
        id: name.to_string(),
        title: title.unwrap_or(name).to_string(),
        url,
        folder_id: config.looker_model.clone(),
        owner: OWNER.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// View entry: core aspect, schema when the view has fields, and the
/// view's table and `${TABLE}` columns as BigQuery dependencies
pub fn view_entry(config: &Config, view: &ViewMetadata) -> EntrySpec {
    let url = looker_url(
        config,
        &format!("projects/{}/files/{}.view.lkml", config.looker_model, view.name),
    );

    let mut aspects = AspectSet::new();
    aspects.insert(
        ids::LOOKER_CORE,
        &core(config, &view.name, view.description.as_deref(), url, ["view", "lookml"]),
    );

    if view.field_count() > 0 {
        aspects.insert(
            ids::VIEW_SCHEMA,
            &ViewSchema {
                model: config.looker_model.clone(),
                view: view.name.clone(),
                sql_table_name: view.sql_table_name.clone().unwrap_or_default(),
                derived_table_sql: view.derived_table_sql.clone().unwrap_or_default(),
                fields: view.fields().map(|f| f.descriptor()).collect(),
            },
        );
    }

    if let Some(table) = view
        .sql_table_name
        .as_deref()
        .and_then(|name| BigQueryTable::resolve(name, config))
    {
        let columns = view
            .source_columns()
            .into_iter()
            .map(|column| format!("{}.{}", table, column))
            .collect();
        aspects.insert(
            ids::BQ_DEPENDENCIES,
            &BqDependencies {
                tables: vec![table.fqn().to_string()],
                columns,
            },
        );
    }

    EntrySpec {
        fqn: Fqn::looker(config, EntryKind::View, &view.name),
        kind: EntryKind::View,
        aspects,
    }
}

/// Explore entry: core aspect, join graph, and the tables behind every
/// view of the explore found in `views`
pub fn explore_entry(
    config: &Config,
    explore: &ExploreMetadata,
    views: &BTreeMap<String, ViewMetadata>,
) -> EntrySpec {
    let url = looker_url(config, &format!("explore/{}/{}", config.looker_model, explore.name));
    let explore_views = explore.views();

    let mut aspects = AspectSet::new();
    aspects.insert(
        ids::LOOKER_CORE,
        &core(
            config,
            &explore.name,
            explore.description.as_deref(),
            url,
            ["explore", "semantic_layer"],
        ),
    );
    aspects.insert(
        ids::EXPLORE_GRAPH,
        &ExploreGraph {
            model: config.looker_model.clone(),
            explore: explore.name.clone(),
            views: explore_views.clone(),
            joins: explore.joins.iter().map(|j| j.descriptor()).collect(),
        },
    );

    let mut tables: Vec<String> = Vec::new();
    for view_name in &explore_views {
        let table = views
            .get(view_name)
            .and_then(|view| view.sql_table_name.as_deref())
            .and_then(|name| BigQueryTable::resolve(name, config));
        if let Some(table) = table {
            let fqn = table.fqn().to_string();
            if !tables.contains(&fqn) {
                tables.push(fqn);
            }
        }
    }
    if !tables.is_empty() {
        aspects.insert(
            ids::BQ_DEPENDENCIES,
            &BqDependencies {
                tables,
                columns: Vec::new(),
            },
        );
    }

    EntrySpec {
        fqn: Fqn::looker(config, EntryKind::Explore, &explore.name),
        kind: EntryKind::Explore,
        aspects,
    }
}

pub fn dashboard_entry(config: &Config, dashboard: &Dashboard) -> EntrySpec {
    let url = looker_url(config, &format!("dashboards/{}", dashboard.name));

    let mut aspects = AspectSet::new();
    aspects.insert(
        ids::LOOKER_CORE,
        &core(
            config,
            &dashboard.name,
            dashboard.title.as_deref(),
            url,
            ["dashboard", "analytics"],
        ),
    );

    if !dashboard.elements.is_empty() {
        aspects.insert(
            ids::DASHBOARD_STRUCTURE,
            &DashboardStructure {
                elements: dashboard.elements.len(),
                explores_used: dashboard.explores.clone(),
                element_types: dashboard.element_types(),
            },
        );
    }

    EntrySpec {
        fqn: Fqn::looker(config, EntryKind::Dashboard, &dashboard.name),
        kind: EntryKind::Dashboard,
        aspects,
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

    fn card_view() -> ViewMetadata {
        ViewMetadata::parse(
            "view: card {\n sql_table_name: `retail_banking.card` ;;\n \
             dimension: card_id { type: number sql: ${TABLE}.card_id ;; }\n \
             measure: count { type: count }\n}",
            "card",
        )
    }

    #[test]
    fn view_aspects() {
        let spec = view_entry(&config(), &card_view());

        assert_eq!(spec.fqn.as_str(), "custom:looker.view:mylooker.retail_banking.card");
        assert_eq!(spec.entry_id(), "mylooker-retail_banking-card");
        assert_eq!(
            spec.aspects.get(ids::LOOKER_CORE).unwrap(),
            &json!({
                "id": "card",
                "title": "card",
                "url": "https://mylooker.looker.com/projects/retail_banking/files/card.view.lkml",
                "folderId": "retail_banking",
                "owner": "system",
                "tags": ["view", "lookml"]
            })
        );
        assert_eq!(
            spec.aspects.get(ids::VIEW_SCHEMA).unwrap()["fields"],
            json!(["card_id:dimension:number", "count:measure:count"])
        );
        assert_eq!(
            spec.aspects.get(ids::BQ_DEPENDENCIES).unwrap(),
            &json!({
                "tables": ["bigquery:proj.retail_banking.card"],
                "columns": ["proj.retail_banking.card.card_id"]
            })
        );
    }

    #[test]
    fn view_without_fields_has_no_schema() {
        let view = ViewMetadata::parse("view: empty {}", "empty");
        let spec = view_entry(&config(), &view);

        assert!(spec.aspects.contains(ids::LOOKER_CORE));
        assert!(!spec.aspects.contains(ids::VIEW_SCHEMA));
        assert!(!spec.aspects.contains(ids::BQ_DEPENDENCIES));
    }

    #[test]
    fn explore_resolves_tables_through_views() {
        let explore = lookplex_lookml::explore::parse_explores(
            "explore: card_transactions {\n join: card { sql_on: ${a.x} = ${card.x} ;; }\n join: client {}\n}",
        )
        .remove(0);
        let mut views = BTreeMap::new();
        views.insert("card".to_string(), card_view());

        let spec = explore_entry(&config(), &explore, &views);

        assert_eq!(spec.fqn.as_str(), "looker:explore:mylooker.retail_banking.card_transactions");
        let graph = spec.aspects.get(ids::EXPLORE_GRAPH).unwrap();
        assert_eq!(graph["views"], json!(["card_transactions", "card", "client"]));
        assert_eq!(graph["joins"], json!(["card:many_to_one", "client:many_to_one"]));
        assert_eq!(
            spec.aspects.get(ids::BQ_DEPENDENCIES).unwrap()["tables"],
            json!(["bigquery:proj.retail_banking.card"])
        );
    }

    #[test]
    fn dashboard_structure() {
        let dashboard = Dashboard::parse(
            "- dashboard: fraud\n  title: Fraud\n  elements:\n  - name: a\n    explore: card_transactions\n    type: looker_bar\n",
            "fraud",
        );
        let spec = dashboard_entry(&config(), &dashboard);

        assert_eq!(spec.fqn.as_str(), "looker:dashboard:mylooker.retail_banking.fraud");
        assert_eq!(spec.aspects.get(ids::LOOKER_CORE).unwrap()["title"], "Fraud");
        assert_eq!(
            spec.aspects.get(ids::DASHBOARD_STRUCTURE).unwrap(),
            &json!({
                "elements": 1,
                "explores_used": ["card_transactions"],
                "element_types": ["looker_bar"]
            })
        );
    }
}
