//! Associative link backend
//!
//! The backend stores flat links and is driven through a declarative
//! query protocol (one query string plus report flags per invocation).
//! The trait seam lets the rest of the crate run against either the
//! external tool or an in-process engine.

mod cli;
mod memory;
mod traits;

pub use cli::{CliBackend, DEFAULT_PROGRAM};
pub use memory::MemoryBackend;
pub use traits::{Backend, ReportFlags};
