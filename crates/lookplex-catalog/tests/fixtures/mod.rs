//! Test fixtures for catalog integration tests
//!
//! LookML sources for ingest and linking. Configuration, the scripted
//! HTTP server and the fake gcloud come from `lookplex-test-utils`.

#![allow(dead_code)]

pub use lookplex_test_utils::{config, FakeGcloud, StubServer};

pub const CARD_VIEW: &str = r#"
view: card {
  sql_table_name: `retail_banking.card` ;;

  dimension: card_id {
    primary_key: yes
    type: number
    sql: ${TABLE}.card_id ;;
  }

  dimension: disp_id {
    type: number
    sql: ${TABLE}.disp_id ;;
  }

  measure: count {
    type: count
  }
}
"#;

pub const ACCOUNT_VIEW: &str = r#"
view: account {
  sql_table_name: `retail_banking.account` ;;

  dimension: account_id {
    type: number
    sql: ${TABLE}.account_id ;;
  }
}
"#;

pub const MODEL: &str = r#"
connection: "bigquery"

explore: card_transactions {
  join: card {
    type: left_outer
    sql_on: ${card_transactions.card_id} = ${card.card_id} ;;
    relationship: many_to_one
  }
}

explore: account_overview {
  view_name: account
}
"#;

pub const DASHBOARD: &str = r#"
- dashboard: customer_account
  title: Customer Account
  layout: newspaper
  elements:
  - name: balance
    model: retail_banking
    explore: account_overview
    type: single_value
  - name: spend
    model: retail_banking
    explore: card_transactions
    type: looker_bar
"#;
