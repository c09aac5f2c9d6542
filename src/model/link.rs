//! Link - the backend's flat triple record

use serde::{Deserialize, Serialize};
use std::fmt;

/// One associative link: `(id: source target)`.
///
/// `id` is assigned by the backend at creation and never changes;
/// `source` and `target` are rewritten by update queries. Within one
/// backend, `id` is unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    pub source: u64,
    pub target: u64,
}

impl Link {
    pub fn new(id: u64, source: u64, target: u64) -> Self {
        Link { id, source, target }
    }
}

impl fmt::Display for Link {
    /// Renders in the backend's notation: whitespace-separated, no commas
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}: {} {})", self.id, self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_notation() {
        let link = Link::new(1, 100, 200);
        assert_eq!(link.to_string(), "(1: 100 200)");
        assert!(!link.to_string().contains(','));
    }
}
