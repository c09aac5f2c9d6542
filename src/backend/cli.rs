//! Subprocess backend invoking the external link tool

use super::{Backend, ReportFlags};
use crate::{Error, Result};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, warn};

/// Default program name for the external link tool
pub const DEFAULT_PROGRAM: &str = "clink";

/// Backend that shells out to the link tool for every query.
///
/// Each invocation is one blocking subprocess; there is no persistent
/// connection between calls. The tool is resolved through `PATH` with
/// the dotnet tool directory prepended, since that is where a
/// `dotnet tool install` puts it.
pub struct CliBackend {
    program: String,
    db_path: PathBuf,
}

impl CliBackend {
    /// Create a backend for the given database file
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        CliBackend {
            program: DEFAULT_PROGRAM.to_string(),
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Use a different program name or path for the tool
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// `PATH` with `~/.dotnet/tools` prepended
    fn search_path() -> OsString {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".dotnet").join("tools"));
        }
        if let Some(path) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&path));
        }

        std::env::join_paths(paths)
            .unwrap_or_else(|_| std::env::var_os("PATH").unwrap_or_default())
    }
}

impl Backend for CliBackend {
    fn invoke(&self, query: &str, flags: ReportFlags) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(query).arg("--db").arg(&self.db_path);
        if flags.before {
            cmd.arg("--before");
        }
        if flags.changes {
            cmd.arg("--changes");
        }
        if flags.after {
            cmd.arg("--after");
        }
        if flags.trace {
            cmd.arg("--trace");
        }
        cmd.env("PATH", Self::search_path());

        debug!(program = %self.program, query, "invoking link backend");

        let output = cmd.output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                error!(program = %self.program, "link backend binary not found");
                Error::BackendUnavailable(format!(
                    "{} not found; install the link tool or configure the program path",
                    self.program
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            error!(query, stderr = %stderr.trim(), "link backend reported a fault");
            return Err(Error::BackendQueryFailed(stderr.trim().to_string()));
        }

        // Diagnostics without a fault are informational only
        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim(), "link backend produced diagnostics");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn describe(&self) -> String {
        format!("{} --db {}", self.program, self.db_path.display())
    }
}
