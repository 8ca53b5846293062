//! Lookplex Core
//!
//! Shared domain model for the Looker → Dataplex sync: runtime
//! configuration, fully-qualified names, aspect payloads, the declarative
//! relationship tables, and batch summaries.

pub mod config;
pub mod fqn;
pub mod aspect;
pub mod relationships;
pub mod report;

pub use config::{Config, ConfigError};
pub use fqn::{BigQueryTable, EntryKind, EntryRef, Fqn};
pub use aspect::{
    AspectSet, BqDependencies, DashboardStructure, ExploreGraph, LookerCore, ViewSchema,
};
pub use relationships::{LineagePlan, Relationships, RelationshipsError, StructuralLinks, TableView, VerifyAssets};
pub use report::{BatchSummary, ReportError, RunReport, REPORT_FORMAT};
