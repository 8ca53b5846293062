//! Lookplex Lineage
//!
//! Records Looker lineage in Google Cloud Data Lineage: one process per
//! hop (BigQuery table → view, views → explore, explore → dashboard), a
//! completed run under each process, and one event per edge.
//!
//! Process ids are derived from the display name and transformation type
//! (see [`model::process_id`]), so repeated runs address the same
//! processes.

pub mod model;
pub mod api;
pub mod client;
pub mod mock;
pub mod builder;

pub use model::{
    process_id, EntityReference, LineageEvent, Link, LinkDirection, Process, Run, RunState,
    TransformationType,
};
pub use api::{LineageApi, LineageError};
pub use client::DataLineageClient;
pub use mock::MockLineage;
pub use builder::{
    AssetLinks, Inspection, LineageBuilder, LineageOptions, LineageReport, ProcessRuns,
    DEFAULT_PROPAGATION_DELAY,
};
