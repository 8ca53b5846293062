//! In-memory lineage API for testing
//!
//! Keeps processes, runs and events in memory. Runs can only be created
//! under stored processes, and `search_links` answers from recorded
//! events, so a test can check the whole lineage graph a builder wrote.
//!
//! ```rust,ignore
//! let lineage = MockLineage::new();
//! lineage.fail_process("BigQuery to Looker View: card").await;
//!
//! let report = LineageBuilder::new(&lineage, &config).run(&plan).await;
//! assert_eq!(lineage.calls().create_run, 9);
//! ```

use crate::api::{LineageApi, LineageError};
use crate::model::{LineageEvent, Link, LinkDirection, Process, Run};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of calls per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_process: usize,
    pub create_process: usize,
    pub list_processes: usize,
    pub delete_process: usize,
    pub create_run: usize,
    pub create_event: usize,
    pub search_links: usize,
}

#[derive(Default)]
struct Counters {
    get_process: AtomicUsize,
    create_process: AtomicUsize,
    list_processes: AtomicUsize,
    delete_process: AtomicUsize,
    create_run: AtomicUsize,
    create_event: AtomicUsize,
    search_links: AtomicUsize,
}

/// Mock lineage API; clones share state
#[derive(Clone, Default)]
pub struct MockLineage {
    processes: Arc<RwLock<BTreeMap<String, Process>>>,

    /// Process name → runs
    runs: Arc<RwLock<BTreeMap<String, Vec<Run>>>>,

    /// (run name, event) in creation order
    events: Arc<RwLock<Vec<(String, LineageEvent)>>>,

    /// Display names whose creation fails
    failing: Arc<RwLock<HashSet<String>>>,

    counters: Arc<Counters>,
}

impl MockLineage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored process (no call is counted)
    pub fn with_process(self, process: Process) -> Self {
        if let Ok(mut processes) = self.processes.try_write() {
            processes.insert(process.name.clone(), process);
        }
        self
    }

    /// Make creation of processes named `display_name` fail with a 403
    pub async fn fail_process(&self, display_name: &str) {
        self.failing.write().await.insert(display_name.to_string());
    }

    pub fn calls(&self) -> CallCounts {
        let load = |counter: &AtomicUsize| counter.load(Ordering::SeqCst);
        CallCounts {
            get_process: load(&self.counters.get_process),
            create_process: load(&self.counters.create_process),
            list_processes: load(&self.counters.list_processes),
            delete_process: load(&self.counters.delete_process),
            create_run: load(&self.counters.create_run),
            create_event: load(&self.counters.create_event),
            search_links: load(&self.counters.search_links),
        }
    }

    pub async fn processes(&self) -> Vec<Process> {
        self.processes.read().await.values().cloned().collect()
    }

    /// Every stored run
    pub async fn all_runs(&self) -> Vec<Run> {
        self.runs.read().await.values().flatten().cloned().collect()
    }

    pub async fn events(&self) -> Vec<(String, LineageEvent)> {
        self.events.read().await.clone()
    }

    fn not_found(name: &str) -> LineageError {
        LineageError::Api {
            status: 404,
            message: format!("{} not found", name),
            hint: None,
        }
    }
}

#[async_trait::async_trait]
impl LineageApi for MockLineage {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn get_process(&self, name: &str) -> Result<Option<Process>, LineageError> {
        self.counters.get_process.fetch_add(1, Ordering::SeqCst);
        Ok(self.processes.read().await.get(name).cloned())
    }

    async fn create_process(&self, process: &Process) -> Result<Process, LineageError> {
        self.counters.create_process.fetch_add(1, Ordering::SeqCst);

        if self.failing.read().await.contains(&process.display_name) {
            return Err(LineageError::Api {
                status: 403,
                message: "Simulated permission failure".to_string(),
                hint: Some("Permission denied".to_string()),
            });
        }

        let mut processes = self.processes.write().await;
        let mut stored = process.clone();
        if stored.name.is_empty() {
            stored.name = format!("projects/mock/locations/mock/processes/p-{}", processes.len());
        }
        processes.insert(stored.name.clone(), stored.clone());
        Ok(stored)
    }

    async fn list_processes(&self) -> Result<Vec<Process>, LineageError> {
        self.counters.list_processes.fetch_add(1, Ordering::SeqCst);
        Ok(self.processes().await)
    }

    async fn delete_process(&self, name: &str) -> Result<(), LineageError> {
        self.counters.delete_process.fetch_add(1, Ordering::SeqCst);
        self.processes.write().await.remove(name);
        self.runs.write().await.remove(name);
        let prefix = format!("{}/runs/", name);
        self.events.write().await.retain(|(run, _)| !run.starts_with(&prefix));
        Ok(())
    }

    async fn get_run(&self, name: &str) -> Result<Option<Run>, LineageError> {
        Ok(self
            .runs
            .read()
            .await
            .values()
            .flatten()
            .find(|run| run.name == name)
            .cloned())
    }

    async fn create_run(&self, process_name: &str, run: &Run) -> Result<Run, LineageError> {
        self.counters.create_run.fetch_add(1, Ordering::SeqCst);

        if !self.processes.read().await.contains_key(process_name) {
            return Err(Self::not_found(process_name));
        }

        let mut runs = self.runs.write().await;
        let process_runs = runs.entry(process_name.to_string()).or_default();
        let mut stored = run.clone();
        if stored.name.is_empty() {
            stored.name = format!("{}/runs/r-{}", process_name, process_runs.len());
        }
        process_runs.push(stored.clone());
        Ok(stored)
    }

    async fn list_runs(&self, process_name: &str) -> Result<Vec<Run>, LineageError> {
        Ok(self.runs.read().await.get(process_name).cloned().unwrap_or_default())
    }

    async fn create_event(&self, run_name: &str, event: &LineageEvent) -> Result<(), LineageError> {
        self.counters.create_event.fetch_add(1, Ordering::SeqCst);

        if self.get_run(run_name).await?.is_none() {
            return Err(Self::not_found(run_name));
        }
        self.events.write().await.push((run_name.to_string(), event.clone()));
        Ok(())
    }

    async fn search_links(&self, fqn: &str, direction: LinkDirection) -> Result<Vec<Link>, LineageError> {
        self.counters.search_links.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .events
            .read()
            .await
            .iter()
            .flat_map(|(run, event)| {
                event.links.iter().map(move |link| Link {
                    name: format!("{}/links", run),
                    source: link.source.clone(),
                    target: link.target.clone(),
                })
            })
            .filter(|link| direction.matches(link, fqn))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn run_requires_process() {
        let lineage = MockLineage::new();
        let run = Run::completed("projects/p/locations/l/processes/x", "r", Utc::now());

        let result = lineage.create_run("projects/p/locations/l/processes/x", &run).await;
        assert!(matches!(result, Err(LineageError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn delete_drops_runs_and_events() {
        let process = Process {
            name: "projects/p/locations/l/processes/x".to_string(),
            display_name: "x".to_string(),
            attributes: Default::default(),
            origin: None,
        };
        let lineage = MockLineage::new().with_process(process.clone());
        let run = lineage
            .create_run(&process.name, &Run::completed(&process.name, "r", Utc::now()))
            .await
            .unwrap();
        lineage
            .create_event(&run.name, &LineageEvent::single("a", "b", Utc::now()))
            .await
            .unwrap();

        assert_eq!(lineage.search_links("a", LinkDirection::Downstream).await.unwrap().len(), 1);
        assert_eq!(lineage.search_links("a", LinkDirection::Upstream).await.unwrap().len(), 0);

        lineage.delete_process(&process.name).await.unwrap();
        assert!(lineage.processes().await.is_empty());
        assert!(lineage.all_runs().await.is_empty());
        assert!(lineage.events().await.is_empty());
    }
}
