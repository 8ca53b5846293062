//! Stand-in `gcloud` executable
//!
//! A shell script that records its arguments, prints a fixed message to
//! stderr and exits 1. Point `Gcloud::with_program` at [`FakeGcloud::program`].

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeGcloud {
    dir: TempDir,
    program: PathBuf,
}

impl FakeGcloud {
    /// Script that fails with `stderr`
    #[cfg(unix)]
    pub fn failing(stderr: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("fake gcloud dir");
        let program = dir.path().join("gcloud");
        let args_file = dir.path().join("args");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\necho '{}' >&2\nexit 1\n",
            args_file.display(),
            stderr.replace('\'', "")
        );
        fs::write(&program, script).expect("write fake gcloud");
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).expect("make fake gcloud executable");

        Self { dir, program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments of the last invocation, one per element
    pub fn last_args(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("args"))
            .map(|args| args.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
