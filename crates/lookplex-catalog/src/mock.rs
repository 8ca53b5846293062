//! In-memory catalog backend for testing
//!
//! Stores entries, links and setup resources in memory and counts every
//! call, so tests can check how many creates or existence checks an
//! operation issued.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lookplex_catalog::{MockCatalog, CatalogBackend};
//! use lookplex_core::{EntryKind, EntryRef};
//!
//! let catalog = MockCatalog::new()
//!     .with_entry(EntryRef::new("looker", "mylooker-retail_banking-card"), EntryKind::View);
//!
//! assert!(catalog.entry_exists(&EntryRef::new("looker", "mylooker-retail_banking-card")).await?);
//! assert_eq!(catalog.calls().entry_exists, 1);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Every link creation fails with a 500
//! let catalog = MockCatalog::new().with_link_failure();
//!
//! // One entry id fails on every call that touches it
//! catalog.add_error_for_entry("broken", CatalogError::Network("reset".into())).await;
//! ```

use crate::backend::{
    AspectTypeSpec, CatalogBackend, CatalogEntry, CatalogError, CreateEntryRequest, CreateStatus,
    EntryLinkRequest, EntryTypeSpec,
};
use lookplex_core::{EntryKind, EntryRef};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of calls per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub entry_exists: usize,
    pub create_entry: usize,
    pub list_entries: usize,
    pub create_entry_link: usize,
    pub setup: usize,
}

#[derive(Default)]
struct Counters {
    entry_exists: AtomicUsize,
    create_entry: AtomicUsize,
    list_entries: AtomicUsize,
    create_entry_link: AtomicUsize,
    setup: AtomicUsize,
}

/// Mock catalog backend
///
/// Clones share state, so a test can keep a handle while the code under
/// test owns another.
#[derive(Clone)]
pub struct MockCatalog {
    /// Entries keyed by (entry group, entry id)
    entries: Arc<RwLock<BTreeMap<(String, String), CatalogEntry>>>,

    /// Created links in creation order
    links: Arc<RwLock<Vec<EntryLinkRequest>>>,

    /// Setup resources: "entry-group", "aspect-type/{id}", "entry-type/{id}"
    resources: Arc<RwLock<BTreeSet<String>>>,

    /// Errors returned for calls touching a given entry id
    errors: Arc<RwLock<HashMap<String, CatalogError>>>,

    counters: Arc<Counters>,

    fail_links: bool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            links: Arc::new(RwLock::new(Vec::new())),
            resources: Arc::new(RwLock::new(BTreeSet::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            fail_links: false,
        }
    }

    /// Seed an existing entry (no call is counted)
    pub fn with_entry(self, entry: EntryRef, kind: EntryKind) -> Self {
        if let Ok(mut entries) = self.entries.try_write() {
            let listed = Self::listed(&entry, kind.entry_type_id(), None);
            entries.insert((entry.entry_group, entry.entry_id), listed);
        }
        self
    }

    /// Fail every link creation with a 500
    pub fn with_link_failure(mut self) -> Self {
        self.fail_links = true;
        self
    }

    /// Return `error` from any call touching `entry_id`
    pub async fn add_error_for_entry(&self, entry_id: &str, error: CatalogError) {
        self.errors.write().await.insert(entry_id.to_string(), error);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            entry_exists: self.counters.entry_exists.load(Ordering::SeqCst),
            create_entry: self.counters.create_entry.load(Ordering::SeqCst),
            list_entries: self.counters.list_entries.load(Ordering::SeqCst),
            create_entry_link: self.counters.create_entry_link.load(Ordering::SeqCst),
            setup: self.counters.setup.load(Ordering::SeqCst),
        }
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn get_entry(&self, entry: &EntryRef) -> Option<CatalogEntry> {
        self.entries
            .read()
            .await
            .get(&(entry.entry_group.clone(), entry.entry_id.clone()))
            .cloned()
    }

    pub async fn links(&self) -> Vec<EntryLinkRequest> {
        self.links.read().await.clone()
    }

    pub async fn resources(&self) -> Vec<String> {
        self.resources.read().await.iter().cloned().collect()
    }

    fn listed(entry: &EntryRef, entry_type: &str, fqn: Option<String>) -> CatalogEntry {
        CatalogEntry {
            name: format!("entryGroups/{}/entries/{}", entry.entry_group, entry.entry_id),
            entry_type: format!("entryTypes/{}", entry_type),
            fully_qualified_name: fqn,
        }
    }

    async fn check_error(&self, entry_id: &str) -> Result<(), CatalogError> {
        match self.errors.read().await.get(entry_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn add_resource(&self, resource: String) -> CreateStatus {
        self.counters.setup.fetch_add(1, Ordering::SeqCst);
        if self.resources.write().await.insert(resource) {
            CreateStatus::Created
        } else {
            CreateStatus::AlreadyExists
        }
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CatalogBackend for MockCatalog {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn entry_exists(&self, entry: &EntryRef) -> Result<bool, CatalogError> {
        self.counters.entry_exists.fetch_add(1, Ordering::SeqCst);
        self.check_error(&entry.entry_id).await?;

        let key = (entry.entry_group.clone(), entry.entry_id.clone());
        Ok(self.entries.read().await.contains_key(&key))
    }

    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<CreateStatus, CatalogError> {
        self.counters.create_entry.fetch_add(1, Ordering::SeqCst);
        self.check_error(&request.entry.entry_id).await?;

        let key = (request.entry.entry_group.clone(), request.entry.entry_id.clone());
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return Ok(CreateStatus::AlreadyExists);
        }

        let listed = Self::listed(
            &request.entry,
            request.kind.entry_type_id(),
            Some(request.fqn.to_string()),
        );
        entries.insert(key, listed);
        Ok(CreateStatus::Created)
    }

    async fn list_entries(&self, entry_group: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.counters.list_entries.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|((group, _), _)| group == entry_group)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn create_entry_link(&self, link: &EntryLinkRequest) -> Result<CreateStatus, CatalogError> {
        self.counters.create_entry_link.fetch_add(1, Ordering::SeqCst);
        self.check_error(&link.source.entry_id).await?;
        self.check_error(&link.target.entry_id).await?;

        if self.fail_links {
            return Err(CatalogError::Api {
                status: 500,
                message: "Simulated link failure".to_string(),
                hint: None,
            });
        }

        let mut links = self.links.write().await;
        if links.contains(link) {
            return Ok(CreateStatus::AlreadyExists);
        }
        links.push(link.clone());
        Ok(CreateStatus::Created)
    }

    async fn create_entry_group(&self, _description: &str) -> Result<CreateStatus, CatalogError> {
        Ok(self.add_resource("entry-group".to_string()).await)
    }

    async fn create_aspect_type(&self, spec: &AspectTypeSpec) -> Result<CreateStatus, CatalogError> {
        Ok(self.add_resource(format!("aspect-type/{}", spec.id)).await)
    }

    async fn create_entry_type(&self, spec: &EntryTypeSpec) -> Result<CreateStatus, CatalogError> {
        Ok(self.add_resource(format!("entry-type/{}", spec.id)).await)
    }
}
