//! Derived statistics over the link and blob substrates
//!
//! All counts are computed on demand from a fresh scan and never cached.

use serde::Serialize;

/// Counts for the menu hierarchy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MenuStats {
    /// Every link currently in the backend
    pub total_links: u64,
    /// Every stored item blob
    pub total_files: u64,
    /// Links whose target is the reserved root parent
    pub root_items: u64,
}

/// Counts for the authentication entities.
///
/// `dependent_links` is an estimate of the combined token and password
/// population: both kinds share the `(entityId, userNumericId)` link
/// shape and cannot be told apart from the link set alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthStats {
    pub total_links: u64,
    /// Links whose target is the user type tag
    pub user_links: u64,
    pub user_files: u64,
    /// Links whose target is not the user type tag (estimate, see above)
    pub dependent_links: u64,
    pub token_files: u64,
    pub password_files: u64,
}

/// Outcome of a reconciliation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Links removed because no blob backed their source
    pub removed_links: u64,
    /// Blobs removed because no link referenced them
    pub removed_blobs: u64,
}
