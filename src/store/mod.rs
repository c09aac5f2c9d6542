//! Storage layers: the link client and the blob store
//!
//! Links hold structure, blobs hold payloads. The two substrates fail
//! independently and share no transaction; the materializers above this
//! layer are what keep them consistent, best-effort.

mod blobs;
mod links;

pub use blobs::{BlobStore, Namespace};
pub use links::LinkStore;
