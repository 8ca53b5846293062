//! Writes the lineage chain tables → views → explores → dashboards
//!
//! Each hop is a process with one completed run and one event per edge.
//! Processes and runs are looked up by their deterministic names before
//! they are created, so re-running without cleanup adds events to the
//! existing graph instead of duplicating processes.

use crate::api::{LineageApi, LineageError};
use crate::model::{LineageEvent, LinkDirection, Process, Run, TransformationType};
use chrono::Utc;
use lookplex_core::{BatchSummary, BigQueryTable, Config, EntryKind, Fqn, LineagePlan, VerifyAssets};
use std::time::Duration;

/// Pause after cleanup so deletions are visible before recreation
pub const DEFAULT_PROPAGATION_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageOptions {
    /// Delete every process in the location first
    pub cleanup: bool,
    pub propagation_delay: Duration,
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            cleanup: true,
            propagation_delay: DEFAULT_PROPAGATION_DELAY,
        }
    }
}

/// One source → target edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: Fqn,
    pub target: Fqn,
}

/// Links found for one asset during verification
///
/// `None` means the search itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLinks {
    pub fqn: Fqn,
    pub downstream: Option<Vec<String>>,
    pub upstream: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageReport {
    pub batches: Vec<BatchSummary>,
    pub verification: Vec<AssetLinks>,
}

impl LineageReport {
    pub fn has_failures(&self) -> bool {
        self.batches.iter().any(BatchSummary::has_failures)
    }
}

/// A process with its runs
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRuns {
    pub process: Process,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub processes: Vec<ProcessRuns>,
    pub links: Vec<AssetLinks>,
}

pub struct LineageBuilder<'a> {
    api: &'a dyn LineageApi,
    config: &'a Config,
    options: LineageOptions,
}

impl<'a> LineageBuilder<'a> {
    pub fn new(api: &'a dyn LineageApi, config: &'a Config) -> Self {
        Self {
            api,
            config,
            options: LineageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LineageOptions) -> Self {
        self.options = options;
        self
    }

    fn looker_fqn(&self, kind: EntryKind, name: &str) -> Fqn {
        Fqn::looker(self.config, kind, name)
    }

    /// Delete every process in the location
    ///
    /// Destructive: this also removes processes other tools created.
    pub async fn cleanup_all_processes(&self) -> BatchSummary {
        let mut batch = BatchSummary::new("process cleanup");

        let processes = match self.api.list_processes().await {
            Ok(processes) => processes,
            Err(e) => {
                tracing::error!("Failed to list processes: {}", e);
                log_hint(&e);
                batch.record_failure();
                return batch;
            }
        };

        if processes.is_empty() {
            tracing::info!("No existing processes, nothing to clean up");
            return batch;
        }

        tracing::warn!("Deleting {} lineage processes in {}", processes.len(), self.config.location);
        for process in &processes {
            match self.api.delete_process(&process.name).await {
                Ok(()) => {
                    tracing::info!("Deleted {} ({})", process.display_name, process.id());
                    batch.record_success();
                }
                Err(e) => {
                    tracing::error!("Failed to delete {}: {}", process.name, e);
                    batch.record_failure();
                }
            }
        }

        batch
    }

    /// Existing process with this name, or a newly created one
    pub async fn ensure_process(
        &self,
        display_name: &str,
        transformation: TransformationType,
    ) -> Result<Process, LineageError> {
        let process = Process::new(self.config, display_name, transformation);

        if let Some(existing) = self.api.get_process(&process.name).await? {
            tracing::info!("Process already exists: {}", display_name);
            return Ok(existing);
        }

        let created = self.api.create_process(&process).await?;
        tracing::info!("Created process: {} ({})", display_name, created.id());
        Ok(created)
    }

    async fn ensure_run(&self, process: &Process, display_name: &str) -> Result<Run, LineageError> {
        let run = Run::completed(&process.name, display_name, Utc::now());

        if let Some(existing) = self.api.get_run(&run.name).await? {
            return Ok(existing);
        }
        self.api.create_run(&process.name, &run).await
    }

    /// Process, run, then one event per edge. Every edge counts once in `batch`;
    /// an empty edge list is one skip and creates nothing.
    async fn record(
        &self,
        batch: &mut BatchSummary,
        display_name: &str,
        transformation: TransformationType,
        run_display_name: &str,
        edges: &[Edge],
    ) {
        if edges.is_empty() {
            tracing::warn!("{} has no edges, skipping", display_name);
            batch.record_skip();
            return;
        }

        let process = match self.ensure_process(display_name, transformation).await {
            Ok(process) => process,
            Err(e) => {
                tracing::error!("Failed to create process {}: {}", display_name, e);
                log_hint(&e);
                edges.iter().for_each(|_| batch.record_failure());
                return;
            }
        };

        // Runs go under the name the API returned
        let run = match self.ensure_run(&process, run_display_name).await {
            Ok(run) => run,
            Err(e) => {
                tracing::error!("Failed to create run under {}: {}", process.name, e);
                log_hint(&e);
                edges.iter().for_each(|_| batch.record_failure());
                return;
            }
        };

        for edge in edges {
            let event = LineageEvent::single(edge.source.as_str(), edge.target.as_str(), Utc::now());
            match self.api.create_event(&run.name, &event).await {
                Ok(()) => {
                    tracing::info!("Lineage {} → {}", edge.source.short_name(), edge.target.short_name());
                    batch.record_success();
                }
                Err(e) => {
                    tracing::error!("Failed to record {} → {}: {}", edge.source, edge.target, e);
                    batch.record_failure();
                }
            }
        }
    }

    /// BigQuery table → view, one process per view
    pub async fn table_views(&self, plan: &LineagePlan) -> BatchSummary {
        let mut batch = BatchSummary::new("table → view lineage");

        for pair in &plan.table_views {
            let Some(table) = BigQueryTable::resolve(&pair.table, self.config) else {
                tracing::warn!("Cannot resolve table {:?}, skipping", pair.table);
                batch.record_skip();
                continue;
            };

            let edges = [Edge {
                source: table.fqn(),
                target: self.looker_fqn(EntryKind::View, &pair.view),
            }];
            self.record(
                &mut batch,
                &format!("BigQuery to Looker View: {}", pair.view),
                TransformationType::ViewTransformation,
                &format!("Transform {} to {}", table.table, pair.view),
                &edges,
            )
            .await;
        }

        batch
    }

    /// Views → explore, one process per explore with an event per view
    pub async fn view_explores(&self, plan: &LineagePlan) -> BatchSummary {
        let mut batch = BatchSummary::new("view → explore lineage");

        for (explore, views) in &plan.view_explores {
            let target = self.looker_fqn(EntryKind::Explore, explore);
            let edges: Vec<Edge> = views
                .iter()
                .map(|view| Edge {
                    source: self.looker_fqn(EntryKind::View, view),
                    target: target.clone(),
                })
                .collect();

            self.record(
                &mut batch,
                &format!("Views to Looker Explore: {}", explore),
                TransformationType::ExploreTransformation,
                &format!("Aggregate views to {}", explore),
                &edges,
            )
            .await;
        }

        batch
    }

    /// Explore → dashboard, one process per pair
    pub async fn explore_dashboards(&self, plan: &LineagePlan) -> BatchSummary {
        let mut batch = BatchSummary::new("explore → dashboard lineage");

        for (explore, dashboards) in &plan.explore_dashboards {
            for dashboard in dashboards {
                let edges = [Edge {
                    source: self.looker_fqn(EntryKind::Explore, explore),
                    target: self.looker_fqn(EntryKind::Dashboard, dashboard),
                }];
                self.record(
                    &mut batch,
                    &format!("Explore to Dashboard: {} to {}", explore, dashboard),
                    TransformationType::DashboardVisualization,
                    &format!("Visualize {} in {}", explore, dashboard),
                    &edges,
                )
                .await;
            }
        }

        batch
    }

    fn verify_fqns(&self, assets: &VerifyAssets) -> Vec<Fqn> {
        let tables = assets
            .tables
            .iter()
            .filter_map(|t| BigQueryTable::resolve(t, self.config))
            .map(|t| t.fqn());
        let looker = [
            (EntryKind::View, &assets.views),
            (EntryKind::Explore, &assets.explores),
            (EntryKind::Dashboard, &assets.dashboards),
        ]
        .into_iter()
        .flat_map(|(kind, names)| names.iter().map(move |name| (kind, name)))
        .map(|(kind, name)| self.looker_fqn(kind, name));

        tables.chain(looker).collect()
    }

    async fn search(&self, fqn: &Fqn, direction: LinkDirection) -> Option<Vec<String>> {
        match self.api.search_links(fqn.as_str(), direction).await {
            Ok(links) => Some(
                links
                    .into_iter()
                    .map(|link| match direction {
                        LinkDirection::Downstream => link.target.fully_qualified_name,
                        LinkDirection::Upstream => link.source.fully_qualified_name,
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("Link search for {} failed: {}", fqn, e);
                None
            }
        }
    }

    /// Upstream and downstream links of each sample asset
    pub async fn verify(&self, assets: &VerifyAssets) -> Vec<AssetLinks> {
        let mut results = Vec::new();
        for fqn in self.verify_fqns(assets) {
            let downstream = self.search(&fqn, LinkDirection::Downstream).await;
            let upstream = self.search(&fqn, LinkDirection::Upstream).await;
            tracing::info!(
                "{}: {} downstream, {} upstream",
                fqn.short_name(),
                downstream.as_ref().map_or(0, Vec::len),
                upstream.as_ref().map_or(0, Vec::len)
            );
            results.push(AssetLinks {
                fqn,
                downstream,
                upstream,
            });
        }
        results
    }

    /// Cleanup, delay, the three hops, then verification
    pub async fn run(&self, plan: &LineagePlan) -> LineageReport {
        let mut report = LineageReport::default();

        if self.options.cleanup {
            report.batches.push(self.cleanup_all_processes().await);
            if !self.options.propagation_delay.is_zero() {
                tracing::info!(
                    "Waiting {}s for cleanup to propagate",
                    self.options.propagation_delay.as_secs()
                );
                tokio::time::sleep(self.options.propagation_delay).await;
            }
        } else {
            tracing::info!("Cleanup disabled, reusing deterministic process ids");
        }

        report.batches.push(self.table_views(plan).await);
        report.batches.push(self.view_explores(plan).await);
        report.batches.push(self.explore_dashboards(plan).await);
        report.verification = self.verify(&plan.verify).await;

        report
    }

    /// Processes with their runs, and links of the sample assets
    pub async fn inspect(&self, assets: &VerifyAssets) -> Result<Inspection, LineageError> {
        let mut processes = Vec::new();
        for process in self.api.list_processes().await? {
            let runs = self.api.list_runs(&process.name).await?;
            processes.push(ProcessRuns { process, runs });
        }

        Ok(Inspection {
            processes,
            links: self.verify(assets).await,
        })
    }
}

fn log_hint(error: &LineageError) {
    if let Some(hint) = error.hint() {
        tracing::warn!("{}", hint);
    }
}
