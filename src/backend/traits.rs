//! Backend trait definition

use crate::Result;

/// Report flags passed with every query.
///
/// The backend can report the pre-state, the applied changes, the
/// post-state, and an evaluation trace; each maps to one flag on the
/// invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportFlags {
    pub before: bool,
    pub changes: bool,
    pub after: bool,
    pub trace: bool,
}

impl ReportFlags {
    /// Report applied changes only
    pub fn changes() -> Self {
        ReportFlags {
            changes: true,
            ..ReportFlags::default()
        }
    }

    /// Report post-state only
    pub fn after() -> Self {
        ReportFlags {
            after: true,
            ..ReportFlags::default()
        }
    }
}

/// Trait for executing queries against an associative link backend
///
/// Implementations:
/// - `CliBackend` invokes the external tool, one process per query
/// - `MemoryBackend` keeps links in memory, for tests and demos
///
/// Every invocation is independent: no connection, no session, no
/// transaction spanning calls.
pub trait Backend: Send + Sync {
    /// Execute one query and return the backend's textual output.
    ///
    /// Zero matches is a successful empty output, never an error.
    fn invoke(&self, query: &str, flags: ReportFlags) -> Result<String>;

    /// Human-readable description of this backend, for logs
    fn describe(&self) -> String;
}
