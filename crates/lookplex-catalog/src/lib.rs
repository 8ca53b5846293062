//! Dataplex catalog sync for Looker assets
//!
//! Turns extracted LookML into Dataplex entries with custom aspects, links
//! them to each other and to their BigQuery tables, and provisions the
//! entry group, aspect types and entry types they need.
//!
//! ## Backends
//!
//! - [`DataplexCatalog`] talks to Dataplex: REST for reads and entry
//!   links, the `gcloud` CLI for creates
//! - [`MockCatalog`] keeps everything in memory for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use lookplex_catalog::{AuthorizedClient, Credentials, DataplexCatalog, EntryWriter, entries};
//!
//! let client = AuthorizedClient::new(Credentials::gcloud())?;
//! let catalog = DataplexCatalog::new(config.clone(), client);
//! let writer = EntryWriter::new(&catalog, &config);
//! let batch = writer.ensure_all("views", &specs).await;
//! ```

pub mod auth;
pub mod http;
pub mod backend;
pub mod gcloud;
pub mod dataplex;
pub mod mock;
pub mod entries;
pub mod writer;
pub mod linker;
pub mod setup;

pub use auth::{AccessToken, AuthError, Credentials, GcloudTokenProvider, StaticTokenProvider, TokenProvider};
pub use http::{AuthorizedClient, HttpError, StatusClass};
pub use backend::{
    AspectTypeSpec, CatalogBackend, CatalogEntry, CatalogError, CreateEntryRequest, CreateStatus,
    EntryLinkRequest, EntryTypeSpec, LinkKind,
};
pub use dataplex::DataplexCatalog;
pub use mock::{CallCounts, MockCatalog};
pub use entries::EntrySpec;
pub use writer::{EntryOutcome, EntryWriter};
pub use linker::{KnownEntries, LinkOutcome, LinkSummary, RelationshipLinker};
pub use setup::CatalogSetup;
