//! Test fixtures for lineage integration tests
//!
//! A small lineage plan. Configuration and the scripted HTTP server come
//! from `lookplex-test-utils`.

#![allow(dead_code)]

pub use lookplex_test_utils::{config, StubServer};

use lookplex_core::{LineagePlan, TableView, VerifyAssets};
use std::collections::BTreeMap;

/// Two tables, one explore over both views, one explore feeding two dashboards
pub fn small_plan() -> LineagePlan {
    let mut view_explores = BTreeMap::new();
    view_explores.insert(
        "card_transactions".to_string(),
        vec!["card".to_string(), "client".to_string()],
    );

    let mut explore_dashboards = BTreeMap::new();
    explore_dashboards.insert(
        "card_transactions".to_string(),
        vec!["fraud_overview".to_string(), "customer_account".to_string()],
    );

    LineagePlan {
        table_views: vec![
            TableView {
                table: "card".to_string(),
                view: "card".to_string(),
            },
            TableView {
                table: "retail_banking.client".to_string(),
                view: "client".to_string(),
            },
        ],
        view_explores,
        explore_dashboards,
        verify: VerifyAssets {
            tables: vec!["card".to_string()],
            views: vec![],
            explores: vec!["card_transactions".to_string()],
            dashboards: vec!["fraud_overview".to_string()],
        },
    }
}
