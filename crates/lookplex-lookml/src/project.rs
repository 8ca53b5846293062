//! LookML project discovery
//!
//! Walks a LookML root and sorts files by role. Loading is per file: a
//! file that cannot be read is logged and skipped so one bad file does
//! not stop a batch.

use crate::dashboard::Dashboard;
use crate::explore::{parse_explores, ExploreMetadata};
use crate::view::ViewMetadata;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const VIEW_SUFFIX: &str = ".view.lkml";
pub const DASHBOARD_SUFFIX: &str = ".dashboard.lookml";
pub const EXPLORE_SUFFIXES: &[&str] = &[".model.lkml", ".explore.lkml", "_explores.lkml"];

/// Name of a LookML file without its compound suffix
pub fn file_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let suffixes = [VIEW_SUFFIX, DASHBOARD_SUFFIX, ".model.lkml", ".explore.lkml", ".lkml", ".lookml"];
    for suffix in suffixes {
        if let Some(stem) = file_name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    file_name
}

/// LookML files under one root, by role, in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookmlProject {
    pub root: PathBuf,
    pub view_files: Vec<PathBuf>,
    pub explore_files: Vec<PathBuf>,
    pub dashboard_files: Vec<PathBuf>,
}

impl LookmlProject {
    /// Walk `root` (hidden directories skipped)
    pub fn discover(root: &Path) -> Result<Self, LookmlError> {
        if !root.is_dir() {
            return Err(LookmlError::RootNotFound(root.display().to_string()));
        }

        let mut project = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| LookmlError::IoError(root.display().to_string(), e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.into_path();
            if name.ends_with(VIEW_SUFFIX) {
                project.view_files.push(path);
            } else if name.ends_with(DASHBOARD_SUFFIX) {
                project.dashboard_files.push(path);
            } else if EXPLORE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                project.explore_files.push(path);
            }
        }

        tracing::debug!(
            root = %root.display(),
            views = project.view_files.len(),
            explore_files = project.explore_files.len(),
            dashboards = project.dashboard_files.len(),
            "Discovered LookML files"
        );

        Ok(project)
    }

    /// Parse every view file
    pub fn load_views(&self) -> Vec<ViewMetadata> {
        self.view_files
            .iter()
            .filter_map(|path| match ViewMetadata::from_file(path) {
                Ok(view) => Some(view),
                Err(e) => {
                    tracing::warn!("Skipping view file: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Views keyed by view name
    pub fn view_cache(&self) -> BTreeMap<String, ViewMetadata> {
        self.load_views()
            .into_iter()
            .map(|view| (view.name.clone(), view))
            .collect()
    }

    /// Explores across all model files keyed by name; later files win
    pub fn load_explores(&self) -> BTreeMap<String, ExploreMetadata> {
        let mut explores = BTreeMap::new();
        for path in &self.explore_files {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping explore file {}: {}", path.display(), e);
                    continue;
                }
            };

            let parsed = parse_explores(&content);
            tracing::debug!("{}: {} explores", path.display(), parsed.len());
            for explore in parsed {
                explores.insert(explore.name.clone(), explore);
            }
        }
        explores
    }

    /// Parse every dashboard file
    pub fn load_dashboards(&self) -> Vec<Dashboard> {
        self.dashboard_files
            .iter()
            .filter_map(|path| match Dashboard::from_file(path) {
                Ok(dashboard) => Some(dashboard),
                Err(e) => {
                    tracing::warn!("Skipping dashboard file: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// LookML loading error types
#[derive(Debug, thiserror::Error)]
pub enum LookmlError {
    #[error("Failed to read {0}: {1}")]
    IoError(String, String),

    #[error("LookML directory not found: {0}")]
    RootNotFound(String),
}
