//! Integration tests for LookML discovery and extraction
//!
//! ```bash
//! cargo test -p lookplex-lookml --test integration_tests
//! ```

mod fixtures;

use lookplex_lookml::{FieldKind, LookmlProject, ViewMetadata};
use pretty_assertions::assert_eq;

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn test_discover_sorts_files_by_role() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_project(dir.path());

    let project = LookmlProject::discover(dir.path()).unwrap();

    let views: Vec<_> = project
        .view_files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(views, vec!["card.view.lkml", "client.view.lkml"]);
    assert_eq!(project.explore_files.len(), 2);
    assert_eq!(project.dashboard_files.len(), 1);
}

#[test]
fn test_discover_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let project = LookmlProject::discover(dir.path()).unwrap();

    assert!(project.view_files.is_empty());
    assert!(project.load_views().is_empty());
    assert!(project.load_explores().is_empty());
}

// =============================================================================
// Extraction
// =============================================================================

#[test]
fn test_view_cache() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_project(dir.path());
    let project = LookmlProject::discover(dir.path()).unwrap();

    let cache = project.view_cache();
    assert_eq!(cache.len(), 2);

    let card = &cache["card"];
    assert_eq!(card.sql_table_name.as_deref(), Some("retail_banking.card"));
    assert_eq!(card.dimensions.len(), 2);
    assert_eq!(card.measures.len(), 1);
    assert_eq!(card.source_columns(), vec!["card_id", "type"]);

    let client = &cache["client"];
    assert_eq!(client.dimensions[1].kind, FieldKind::DimensionGroup);
    assert_eq!(client.dimensions[1].source_column.as_deref(), Some("birth_date"));
}

#[test]
fn test_explores_merged_across_files() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_project(dir.path());
    let project = LookmlProject::discover(dir.path()).unwrap();

    let explores = project.load_explores();
    let names: Vec<_> = explores.keys().cloned().collect();
    assert_eq!(names, vec!["account", "card_transactions"]);

    assert_eq!(
        explores["card_transactions"].views(),
        vec!["card_transactions", "card", "client"]
    );
    assert_eq!(explores["account"].joins[0].join_type, "inner");
    assert_eq!(
        explores["account"].description.as_deref(),
        Some("Accounts with their clients")
    );
}

#[test]
fn test_dashboards() {
    let dir = tempfile::tempdir().unwrap();
    fixtures::write_project(dir.path());
    let project = LookmlProject::discover(dir.path()).unwrap();

    let dashboards = project.load_dashboards();
    assert_eq!(dashboards.len(), 1);

    let dashboard = &dashboards[0];
    assert_eq!(dashboard.name, "card_type_lookup");
    assert_eq!(dashboard.title.as_deref(), Some("Card Type Lookup"));
    assert_eq!(dashboard.elements.len(), 2);
    assert_eq!(dashboard.elements[0].fields, vec!["card.type", "card.count"]);
    assert_eq!(dashboard.explores, vec!["account", "card_transactions"]);
    assert_eq!(dashboard.element_types(), vec!["looker_pie", "table"]);
}

#[test]
fn test_view_from_file_falls_back_to_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orphan.view.lkml");
    std::fs::write(&path, "dimension: amount { type: number sql: ${TABLE}.amt ;}").unwrap();

    let view = ViewMetadata::from_file(&path).unwrap();
    assert_eq!(view.name, "orphan");
    assert_eq!(view.field_count(), 1);
    assert_eq!(view.dimensions[0].source_column.as_deref(), Some("amt"));
}

#[test]
fn test_view_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ViewMetadata::from_file(&dir.path().join("missing.view.lkml"));
    assert!(result.is_err());
}
