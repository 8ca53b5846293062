//! LookML fixture files for extractor integration tests
//!
//! A small slice of the retail_banking project: two views, one model with
//! explores, one explores file and one dashboard.

use std::path::Path;

pub const CARD_VIEW: &str = r#"
view: card {
  sql_table_name: `retail_banking.card` ;;

  dimension: card_id {
    primary_key: yes
    type: number
    sql: ${TABLE}.card_id ;;
  }

  dimension: type {
    type: string
    sql: ${TABLE}.type ;;
  }

  measure: count {
    type: count
    drill_fields: [card_id]
  }
}
"#;

pub const CLIENT_VIEW: &str = r#"
view: client {
  sql_table_name: `retail_banking.client` ;;

  dimension: client_id {
    type: number
    sql: ${TABLE}.client_id ;;
  }

  dimension_group: birth {
    type: time
    timeframes: [date, year]
    sql: ${TABLE}.birth_date ;;
  }
}
"#;

pub const MODEL: &str = r#"
connection: "retail_banking"
include: "/views/*.view.lkml"

explore: card_transactions {
  join: card {
    sql_on: ${card_transactions.card_id} = ${card.card_id} ;;
    relationship: many_to_one
  }
  join: client {
    sql_on: ${card.client_id} = ${client.client_id} ;;
    relationship: many_to_one
  }
}
"#;

pub const EXTRA_EXPLORES: &str = r#"
explore: account {
  description: "Accounts with their clients"
  join: client {
    type: inner
    sql_on: ${account.client_id} = ${client.client_id} ;;
    relationship: one_to_many
  }
}
"#;

pub const DASHBOARD: &str = r#"
- dashboard: card_type_lookup
  title: Card Type Lookup
  elements:
  - name: cards_by_type
    title: Cards by Type
    model: retail_banking
    explore: card_transactions
    type: looker_pie
    fields: [card.type, card.count]
  - name: accounts
    model: retail_banking
    explore: account
    type: table
"#;

/// Write the fixture project under `root`
pub fn write_project(root: &Path) {
    let views = root.join("views");
    let dashboards = root.join("dashboards");
    let hidden = root.join(".git");
    std::fs::create_dir_all(&views).unwrap();
    std::fs::create_dir_all(&dashboards).unwrap();
    std::fs::create_dir_all(&hidden).unwrap();

    std::fs::write(views.join("card.view.lkml"), CARD_VIEW).unwrap();
    std::fs::write(views.join("client.view.lkml"), CLIENT_VIEW).unwrap();
    std::fs::write(root.join("retail_banking.model.lkml"), MODEL).unwrap();
    std::fs::write(root.join("banking_explores.lkml"), EXTRA_EXPLORES).unwrap();
    std::fs::write(dashboards.join("card_type_lookup.dashboard.lookml"), DASHBOARD).unwrap();
    std::fs::write(root.join("README.md"), "not lookml").unwrap();
    std::fs::write(hidden.join("ignored.view.lkml"), CARD_VIEW).unwrap();
}
