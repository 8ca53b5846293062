//! Read-before-write entry creation
//!
//! Each entry is described first and created only when absent. There is
//! no locking: two writers racing on one entry both see it missing, and
//! the loser's create reports "already exists".

use crate::backend::{CatalogBackend, CreateEntryRequest, CreateStatus};
use crate::entries::EntrySpec;
use lookplex_core::{BatchSummary, Config, EntryRef};

/// What happened to one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, EntryOutcome::Failed(_))
    }
}

/// Creates entries in the configured Looker entry group
pub struct EntryWriter<'a> {
    backend: &'a dyn CatalogBackend,
    config: &'a Config,
}

impl<'a> EntryWriter<'a> {
    pub fn new(backend: &'a dyn CatalogBackend, config: &'a Config) -> Self {
        Self { backend, config }
    }

    /// Make sure `spec` exists. Never fails; errors become [`EntryOutcome::Failed`].
    pub async fn ensure_entry(&self, spec: &EntrySpec) -> EntryOutcome {
        let entry = EntryRef::looker(self.config, spec.entry_id());

        match self.backend.entry_exists(&entry).await {
            Ok(true) => {
                tracing::info!("Entry {} already exists, skipping", entry.entry_id);
                return EntryOutcome::AlreadyExists;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to check entry {}: {}", entry.entry_id, e);
                return EntryOutcome::Failed(e.to_string());
            }
        }

        tracing::info!("Creating entry {} ({})", entry.entry_id, spec.fqn);
        let request = CreateEntryRequest {
            entry,
            kind: spec.kind,
            fqn: spec.fqn.clone(),
            aspects: spec.aspects.clone(),
        };

        match self.backend.create_entry(&request).await {
            Ok(CreateStatus::Created) => {
                tracing::info!("Created {}", request.entry.entry_id);
                EntryOutcome::Created
            }
            Ok(CreateStatus::AlreadyExists) => {
                tracing::info!("Entry {} was created concurrently", request.entry.entry_id);
                EntryOutcome::AlreadyExists
            }
            Err(e) => {
                tracing::error!("Failed to create entry {}: {}", request.entry.entry_id, e);
                if let Some(hint) = e.hint() {
                    tracing::warn!("{}", hint);
                }
                EntryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Ensure every spec in order, one at a time
    pub async fn ensure_all(&self, label: &str, specs: &[EntrySpec]) -> BatchSummary {
        let mut batch = BatchSummary::new(label);
        for spec in specs {
            let outcome = self.ensure_entry(spec).await;
            batch.record(outcome.is_success());
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CatalogError;
    use crate::mock::MockCatalog;
    use lookplex_core::{AspectSet, EntryKind, Fqn};

    fn config() -> Config {
        Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string())).unwrap()
    }

    fn spec(name: &str) -> EntrySpec {
        EntrySpec {
            fqn: Fqn::explore("mylooker", "retail_banking", name),
            kind: EntryKind::Explore,
            aspects: AspectSet::new(),
        }
    }

    #[tokio::test]
    async fn creates_once() {
        let config = config();
        let catalog = MockCatalog::new();
        let writer = EntryWriter::new(&catalog, &config);

        assert_eq!(writer.ensure_entry(&spec("account")).await, EntryOutcome::Created);
        assert_eq!(writer.ensure_entry(&spec("account")).await, EntryOutcome::AlreadyExists);
        assert_eq!(catalog.calls().create_entry, 1);
        assert_eq!(catalog.calls().entry_exists, 2);
    }

    #[tokio::test]
    async fn failed_check_skips_create() {
        let config = config();
        let catalog = MockCatalog::new();
        catalog
            .add_error_for_entry(
                "mylooker-retail_banking-account",
                CatalogError::Network("timeout".to_string()),
            )
            .await;
        let writer = EntryWriter::new(&catalog, &config);

        let outcome = writer.ensure_entry(&spec("account")).await;
        assert!(!outcome.is_success());
        assert_eq!(catalog.calls().create_entry, 0);
    }

    #[tokio::test]
    async fn batch_counts() {
        let config = config();
        let catalog = MockCatalog::new();
        let writer = EntryWriter::new(&catalog, &config);

        let batch = writer
            .ensure_all("explores", &[spec("a"), spec("b"), spec("a")])
            .await;
        assert_eq!(batch.processed, 3);
        assert_eq!(batch.succeeded, 3);
        assert_eq!(catalog.entry_count().await, 2);
    }
}
