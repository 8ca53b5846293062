//! `gcloud dataplex` invocations
//!
//! Entries, entry groups, aspect types and entry types are created through
//! the CLI. Payload documents are written to temporary JSON files that are
//! removed when the call returns.

use crate::backend::{AspectTypeSpec, CatalogError, CreateEntryRequest, CreateStatus, EntryTypeSpec};
use crate::dataplex::DATAPLEX_API;
use crate::http::remediation_hint;
use lookplex_core::Config;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Captured output of one gcloud run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcloudOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GcloudOutput {
    /// Map a create command's output: "already exists" failures are not errors
    ///
    /// `PERMISSION_DENIED` and `INVALID_ARGUMENT` become 403 / 400 API errors
    /// carrying the same remediation hint as the REST paths.
    pub fn create_status(&self) -> Result<CreateStatus, CatalogError> {
        if self.success {
            return Ok(CreateStatus::Created);
        }
        let stderr = self.stderr.to_lowercase();
        if stderr.contains("already exists") || stderr.contains("already_exists") {
            return Ok(CreateStatus::AlreadyExists);
        }

        let message = self.stderr.trim().to_string();
        match rejected_status(&stderr) {
            Some(status) => Err(CatalogError::Api {
                status,
                message,
                hint: remediation_hint(status, DATAPLEX_API),
            }),
            None => Err(CatalogError::Command(message)),
        }
    }
}

/// HTTP status behind a gcloud rejection, from the canonical error code in stderr
fn rejected_status(stderr: &str) -> Option<u16> {
    if stderr.contains("permission_denied") || stderr.contains("permission denied") {
        Some(403)
    } else if stderr.contains("invalid_argument") {
        Some(400)
    } else {
        None
    }
}

/// gcloud executable
#[derive(Debug, Clone)]
pub struct Gcloud {
    program: String,
}

impl Gcloud {
    pub fn new() -> Self {
        Self {
            program: "gcloud".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub async fn run(&self, args: &[String]) -> Result<GcloudOutput, CatalogError> {
        tracing::debug!("{} {}", self.program, args.join(" "));

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| CatalogError::Command(format!("Failed to run {}: {}", self.program, e)))?;

        Ok(GcloudOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl Default for Gcloud {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `value` to a temporary `.json` file
pub fn write_json_tempfile(value: &serde_json::Value) -> Result<NamedTempFile, CatalogError> {
    let mut file = tempfile::Builder::new()
        .prefix("lookplex-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| CatalogError::Io(e.to_string()))?;

    let json = serde_json::to_string_pretty(value).map_err(|e| CatalogError::Io(e.to_string()))?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| CatalogError::Io(e.to_string()))?;

    Ok(file)
}

fn scope_args(config: &Config) -> [String; 2] {
    [
        format!("--project={}", config.project_id),
        format!("--location={}", config.location),
    ]
}

pub fn create_entry_args(config: &Config, request: &CreateEntryRequest, aspects_file: &Path) -> Vec<String> {
    let mut args = vec![
        "dataplex".to_string(),
        "entries".to_string(),
        "create".to_string(),
        request.entry.entry_id.clone(),
    ];
    args.extend(scope_args(config));
    args.extend([
        format!("--entry-group={}", request.entry.entry_group),
        format!("--entry-type={}", request.kind.entry_type_id()),
        format!("--entry-type-project={}", config.project_id),
        format!("--entry-type-location={}", config.location),
        format!("--aspects={}", aspects_file.display()),
        format!("--fully-qualified-name={}", request.fqn),
    ]);
    args
}

pub fn create_entry_group_args(config: &Config, description: &str) -> Vec<String> {
    let mut args = vec![
        "dataplex".to_string(),
        "entry-groups".to_string(),
        "create".to_string(),
        config.entry_group.clone(),
    ];
    args.extend(scope_args(config));
    args.push(format!("--description={}", description));
    args
}

pub fn create_aspect_type_args(config: &Config, spec: &AspectTypeSpec, template_file: &Path) -> Vec<String> {
    let mut args = vec![
        "dataplex".to_string(),
        "aspect-types".to_string(),
        "create".to_string(),
        spec.id.clone(),
    ];
    args.extend(scope_args(config));
    args.extend([
        format!("--description={}", spec.description),
        format!("--metadata-template-file-name={}", template_file.display()),
    ]);
    args
}

pub fn create_entry_type_args(config: &Config, spec: &EntryTypeSpec) -> Vec<String> {
    let mut args = vec![
        "dataplex".to_string(),
        "entry-types".to_string(),
        "create".to_string(),
        spec.id.clone(),
    ];
    args.extend(scope_args(config));
    args.push(format!("--description={}", spec.description));

    if !spec.required_aspects.is_empty() {
        let required: Vec<String> = spec
            .required_aspects
            .iter()
            .map(|id| config.aspect_type_path(id))
            .collect();
        args.push(format!("--required-aspects={}", required.join(",")));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookplex_core::{AspectSet, EntryKind, EntryRef, Fqn};
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string())).unwrap()
    }

    #[test]
    fn entry_args() {
        let config = config();
        let fqn = Fqn::view("mylooker", "retail_banking", "card");
        let request = CreateEntryRequest {
            entry: EntryRef::looker(&config, fqn.entry_id()),
            kind: EntryKind::View,
            fqn,
            aspects: AspectSet::new(),
        };

        let args = create_entry_args(&config, &request, Path::new("/tmp/a.json"));
        assert_eq!(
            args,
            vec![
                "dataplex",
                "entries",
                "create",
                "mylooker-retail_banking-card",
                "--project=proj",
                "--location=eu",
                "--entry-group=looker",
                "--entry-type=looker-view",
                "--entry-type-project=proj",
                "--entry-type-location=eu",
                "--aspects=/tmp/a.json",
                "--fully-qualified-name=custom:looker.view:mylooker.retail_banking.card",
            ]
        );
    }

    #[test]
    fn entry_type_args_list_required_aspects() {
        let spec = EntryTypeSpec {
            id: "looker-explore".to_string(),
            description: "Explore".to_string(),
            required_aspects: vec!["looker-core".to_string(), "looker-explore-graph".to_string()],
        };

        let args = create_entry_type_args(&config(), &spec);
        assert_eq!(
            args.last().unwrap(),
            "--required-aspects=projects/proj/locations/eu/aspectTypes/looker-core,\
             projects/proj/locations/eu/aspectTypes/looker-explore-graph"
        );
    }

    #[test]
    fn create_status_from_output() {
        let ok = GcloudOutput { success: true, stdout: String::new(), stderr: String::new() };
        assert_eq!(ok.create_status().unwrap(), CreateStatus::Created);

        let exists = GcloudOutput {
            success: false,
            stdout: String::new(),
            stderr: "ERROR: (gcloud.dataplex.entries.create) ALREADY_EXISTS: Entry exists".to_string(),
        };
        assert_eq!(exists.create_status().unwrap(), CreateStatus::AlreadyExists);

        let other = GcloudOutput {
            success: false,
            stdout: String::new(),
            stderr: "ERROR: (gcloud.dataplex.entries.create) INTERNAL: backend error".to_string(),
        };
        let error = other.create_status().unwrap_err();
        assert!(matches!(error, CatalogError::Command(_)));
        assert!(error.hint().is_none());
    }

    #[test]
    fn rejected_create_carries_hint() {
        let denied = GcloudOutput {
            success: false,
            stdout: String::new(),
            stderr: "ERROR: (gcloud.dataplex.entry-groups.create) PERMISSION_DENIED: caller lacks permission"
                .to_string(),
        };
        let error = denied.create_status().unwrap_err();
        assert!(matches!(error, CatalogError::Api { status: 403, .. }));
        assert!(error
            .hint()
            .unwrap()
            .contains("https://console.cloud.google.com/apis/library/dataplex.googleapis.com"));

        let invalid = GcloudOutput {
            success: false,
            stdout: String::new(),
            stderr: "ERROR: (gcloud.dataplex.aspect-types.create) INVALID_ARGUMENT: bad template".to_string(),
        };
        let error = invalid.create_status().unwrap_err();
        assert!(matches!(error, CatalogError::Api { status: 400, .. }));
        assert!(error.hint().unwrap().starts_with("Bad request"));
    }

    #[test]
    fn tempfile_removed_on_drop() {
        let file = write_json_tempfile(&serde_json::json!({"a": 1})).unwrap();
        let path = file.path().to_path_buf();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"a\""));

        drop(file);
        assert!(!path.exists());
    }
}
