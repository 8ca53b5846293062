//! Shared test utilities for the lookplex integration tests
//!
//! - [`config`]: configuration for project `proj` with defaults elsewhere
//! - [`StubServer`]: local HTTP server with scripted responses that records every request
//! - [`FakeGcloud`]: stand-in `gcloud` executable that fails with a chosen stderr

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod gcloud;
pub mod stub;

pub use gcloud::FakeGcloud;
pub use stub::{RecordedRequest, StubServer};

use lookplex_core::Config;

/// Configuration for project `proj` with every other setting defaulted
pub fn config() -> Config {
    Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string()))
        .expect("config with project id")
}
