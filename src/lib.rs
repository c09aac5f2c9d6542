//! # links_db
//!
//! Associative link storage with filesystem JSON blobs.
//!
//! links_db maps rich domain models onto a minimal external backend that
//! stores nothing but flat links `(id: source target)`. Structure lives in
//! the link graph; payloads live on disk as pretty-printed JSON documents,
//! one namespace per entity kind. Views are rebuilt on demand by scanning
//! links and joining them to their blobs.
//!
//! ## Core Concepts
//!
//! - **Links**: backend-assigned `(id, source, target)` records, the atomic
//!   unit of the associative store
//! - **Blobs**: JSON documents keyed by hash-derived identifiers
//! - **Materialization**: reconstructing trees (menus) and typed entity
//!   graphs (users/tokens/passwords) from links plus blobs
//!
//! The two substrates share no transaction. Multi-step operations are
//! sequential and resumable rather than atomic, and every read path
//! tolerates the divergence a partial write can leave behind (dangling
//! links are skipped, orphan blobs are simply unreachable).
//!
//! ## Example
//!
//! ```ignore
//! use links_db::{LinkStore, MemoryBackend};
//!
//! let links = LinkStore::new(Box::new(MemoryBackend::new()));
//! let link = links.create_link(100, 200)?;
//! assert_eq!(links.get_link(link.id)?.unwrap().target, 200);
//! ```

pub mod backend;
pub mod ident;
pub mod model;
pub mod store;

mod auth;
mod error;
mod menu;
mod stats;

pub use auth::AuthStore;
pub use backend::{Backend, CliBackend, MemoryBackend, ReportFlags};
pub use error::{Error, Result};
pub use menu::MenuStore;
pub use model::{Link, MenuNode, PasswordRecord, TokenRecord, UserRecord};
pub use stats::{AuthStats, MenuStats, ReconcileReport};
pub use store::{BlobStore, LinkStore, Namespace};

/// Reserved parent value for root-level menu items
pub const ROOT_PARENT: u64 = 0;

/// Link target tag marking a user entity
pub const USER_TYPE_TAG: u64 = 2000;

/// Link target tag for the flat menu-entry encoding
pub const MENU_ENTRY_TAG: u64 = 1000;
