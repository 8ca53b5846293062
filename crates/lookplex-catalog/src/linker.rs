//! Structural entry links from the relationship tables
//!
//! Three passes: dashboard → explore (`uses`), explore → view (`uses`),
//! view → BigQuery table (`maps_to`). A pair is linked only when both
//! endpoints exist; a missing endpoint is a skip, not a failure. Failed
//! calls are logged and counted, never retried.

use crate::backend::{CatalogBackend, CatalogEntry, CatalogError, CreateStatus, EntryLinkRequest, LinkKind};
use lookplex_core::{BatchSummary, BigQueryTable, Config, EntryKind, EntryRef, Fqn, StructuralLinks};
use std::collections::{BTreeMap, BTreeSet};

/// What happened to one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyExists,
    /// An endpoint is not in the catalog; nothing was sent
    SkippedMissingEndpoint(String),
    Failed(String),
}

/// Counts for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSummary {
    /// Links created or already present
    pub links_created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LinkSummary {
    fn record(&mut self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Created | LinkOutcome::AlreadyExists => self.links_created += 1,
            LinkOutcome::SkippedMissingEndpoint(_) => self.skipped += 1,
            LinkOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn into_batch(self, label: &str) -> BatchSummary {
        BatchSummary {
            label: label.to_string(),
            processed: self.links_created + self.failed,
            succeeded: self.links_created,
            skipped: self.skipped,
            failed: self.failed,
        }
    }
}

/// Entry ids present in the Looker entry group, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownEntries {
    pub dashboards: BTreeSet<String>,
    pub explores: BTreeSet<String>,
    pub views: BTreeSet<String>,
}

impl KnownEntries {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut known = Self::default();
        for entry in entries {
            let id = entry.entry_id().to_string();
            match entry.kind() {
                Some(EntryKind::Dashboard) => {
                    known.dashboards.insert(id);
                }
                Some(EntryKind::Explore) => {
                    known.explores.insert(id);
                }
                Some(EntryKind::View) => {
                    known.views.insert(id);
                }
                Some(EntryKind::Look) | None => {}
            }
        }
        known
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty() && self.explores.is_empty() && self.views.is_empty()
    }
}

pub struct RelationshipLinker<'a> {
    backend: &'a dyn CatalogBackend,
    config: &'a Config,
}

impl<'a> RelationshipLinker<'a> {
    pub fn new(backend: &'a dyn CatalogBackend, config: &'a Config) -> Self {
        Self { backend, config }
    }

    /// List the Looker entry group
    pub async fn known_entries(&self) -> Result<KnownEntries, CatalogError> {
        let entries = self.backend.list_entries(&self.config.entry_group).await?;
        Ok(KnownEntries::from_entries(&entries))
    }

    fn entry_id(&self, kind: EntryKind, name: &str) -> String {
        Fqn::looker(self.config, kind, name).entry_id()
    }

    async fn check_endpoint(&self, entry: &EntryRef, role: &str) -> Option<LinkOutcome> {
        match self.backend.entry_exists(entry).await {
            Ok(true) => None,
            Ok(false) => {
                tracing::warn!("{} entry {} does not exist, skipping link", role, entry);
                Some(LinkOutcome::SkippedMissingEndpoint(entry.to_string()))
            }
            Err(e) => {
                tracing::error!("Failed to check {} entry {}: {}", role, entry, e);
                Some(LinkOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Verify both endpoints, then create the link
    pub async fn create_link(&self, source: &EntryRef, target: &EntryRef, kind: LinkKind) -> LinkOutcome {
        if let Some(outcome) = self.check_endpoint(source, "Source").await {
            return outcome;
        }
        if let Some(outcome) = self.check_endpoint(target, "Target").await {
            return outcome;
        }

        let link = EntryLinkRequest {
            source: source.clone(),
            target: target.clone(),
            kind,
        };

        match self.backend.create_entry_link(&link).await {
            Ok(CreateStatus::Created) => {
                tracing::info!("Linked {} → {} ({})", source.entry_id, target.entry_id, kind);
                LinkOutcome::Created
            }
            Ok(CreateStatus::AlreadyExists) => {
                tracing::info!("Link {} → {} already exists", source.entry_id, target.entry_id);
                LinkOutcome::AlreadyExists
            }
            Err(e) => {
                tracing::error!("Failed to link {} → {}: {}", source.entry_id, target.entry_id, e);
                if let Some(hint) = e.hint() {
                    tracing::warn!("{}", hint);
                }
                LinkOutcome::Failed(e.to_string())
            }
        }
    }

    /// Link parents to children where both are known entries
    async fn link_known_pairs(
        &self,
        pairs: &BTreeMap<String, Vec<String>>,
        parent_kind: EntryKind,
        parents: &BTreeSet<String>,
        child_kind: EntryKind,
        children: &BTreeSet<String>,
    ) -> LinkSummary {
        let mut summary = LinkSummary::default();

        for (parent, child_names) in pairs {
            let parent_id = self.entry_id(parent_kind, parent);
            if !parents.contains(&parent_id) {
                tracing::debug!("{} {} not in catalog, skipping its links", parent_kind, parent);
                continue;
            }

            for child in child_names {
                let child_id = self.entry_id(child_kind, child);
                if !children.contains(&child_id) {
                    tracing::debug!("{} {} not in catalog, skipping", child_kind, child);
                    continue;
                }

                let outcome = self
                    .create_link(
                        &EntryRef::looker(self.config, parent_id.clone()),
                        &EntryRef::looker(self.config, child_id),
                        LinkKind::Uses,
                    )
                    .await;
                summary.record(&outcome);
            }
        }

        summary
    }

    pub async fn link_dashboards_to_explores(
        &self,
        dashboard_explores: &BTreeMap<String, Vec<String>>,
        known: &KnownEntries,
    ) -> LinkSummary {
        self.link_known_pairs(
            dashboard_explores,
            EntryKind::Dashboard,
            &known.dashboards,
            EntryKind::Explore,
            &known.explores,
        )
        .await
    }

    pub async fn link_explores_to_views(
        &self,
        explore_views: &BTreeMap<String, Vec<String>>,
        known: &KnownEntries,
    ) -> LinkSummary {
        self.link_known_pairs(
            explore_views,
            EntryKind::Explore,
            &known.explores,
            EntryKind::View,
            &known.views,
        )
        .await
    }

    /// Link known views to the BigQuery table entries Dataplex maintains
    pub async fn link_views_to_tables(
        &self,
        view_tables: &BTreeMap<String, String>,
        known: &KnownEntries,
    ) -> LinkSummary {
        let mut summary = LinkSummary::default();

        for (view, table_ref) in view_tables {
            let view_id = self.entry_id(EntryKind::View, view);
            if !known.views.contains(&view_id) {
                continue;
            }

            let Some(table) = BigQueryTable::resolve(table_ref, self.config) else {
                tracing::warn!("Cannot resolve table {:?} for view {}", table_ref, view);
                summary.record(&LinkOutcome::SkippedMissingEndpoint(table_ref.clone()));
                continue;
            };

            let outcome = self
                .create_link(
                    &EntryRef::looker(self.config, view_id),
                    &table.entry_ref(),
                    LinkKind::MapsTo,
                )
                .await;
            summary.record(&outcome);
        }

        summary
    }

    /// All three passes; fails only when the entry group cannot be listed
    pub async fn link_all(&self, links: &StructuralLinks) -> Result<Vec<BatchSummary>, CatalogError> {
        let known = self.known_entries().await?;
        tracing::info!(
            dashboards = known.dashboards.len(),
            explores = known.explores.len(),
            views = known.views.len(),
            "Found entries"
        );

        if known.is_empty() {
            tracing::warn!("No entries found in {}; run the ingest commands first", self.config.entry_group);
        }

        Ok(vec![
            self.link_dashboards_to_explores(&links.dashboard_explores, &known)
                .await
                .into_batch("dashboard → explore links"),
            self.link_explores_to_views(&links.explore_views, &known)
                .await
                .into_batch("explore → view links"),
            self.link_views_to_tables(&links.view_tables, &known)
                .await
                .into_batch("view → table links"),
        ])
    }
}
