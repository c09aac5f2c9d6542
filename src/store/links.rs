//! Client for the external associative link backend
//!
//! Translates CRUD calls into declarative queries and parses the
//! backend's link notation back into [`Link`]s. Every operation is one
//! independent backend invocation; `clear` in particular is a read
//! followed by one delete per link, never a single transaction.

use crate::backend::{Backend, ReportFlags};
use crate::model::Link;
use crate::{Error, Result, MENU_ENTRY_TAG};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info};

/// Client for the associative link backend
pub struct LinkStore {
    backend: Box<dyn Backend>,
    link_re: Regex,
    /// Next id for the flat menu-entry encoding
    next_entry_id: Mutex<u64>,
}

impl LinkStore {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        debug!(backend = %backend.describe(), "opening link store");
        LinkStore {
            backend,
            // One link per line: (id: source target), whitespace-separated
            link_re: Regex::new(r"\((\d+):\s+(\d+)\s+(\d+)\)").expect("link pattern is valid"),
            next_entry_id: Mutex::new(1),
        }
    }

    /// The backend this store talks to
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Parse every link in a backend output.
    ///
    /// Tolerates blank lines, partial output, and interleaved non-link
    /// text: anything that does not match the notation is ignored.
    pub fn parse_links(&self, output: &str) -> Vec<Link> {
        output
            .lines()
            .filter_map(|line| self.parse_line(line.trim()))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Option<Link> {
        let caps = self.link_re.captures(line)?;
        Some(Link::new(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ))
    }

    /// Create a link; the backend assigns the id
    pub fn create_link(&self, source: u64, target: u64) -> Result<Link> {
        let query = format!("() (({} {}))", source, target);
        let output = self.backend.invoke(&query, ReportFlags::changes())?;

        match self.parse_links(&output).into_iter().next() {
            Some(link) => {
                debug!(%link, "created link");
                Ok(link)
            }
            None => Err(Error::ParseFailure(format!(
                "no link in backend output for create ({} {}): {:?}",
                source, target, output
            ))),
        }
    }

    /// Read every current link
    pub fn all_links(&self) -> Result<Vec<Link>> {
        let output = self
            .backend
            .invoke("((($i: $s $t)) (($i: $s $t)))", ReportFlags::after())?;
        Ok(self.parse_links(&output))
    }

    /// Read one link by id; absence is `None`
    pub fn get_link(&self, id: u64) -> Result<Option<Link>> {
        let query = format!("((({0}: $s $t)) (({0}: $s $t)))", id);
        let output = self.backend.invoke(&query, ReportFlags::after())?;
        Ok(self.parse_links(&output).into_iter().next())
    }

    /// Rewrite a link's source and target
    pub fn update_link(&self, id: u64, new_source: u64, new_target: u64) -> Result<Link> {
        let query = format!(
            "((({0}: $s $t)) (({0}: {1} {2})))",
            id, new_source, new_target
        );
        self.backend.invoke(&query, ReportFlags::changes())?;

        Ok(Link::new(id, new_source, new_target))
    }

    /// Delete a link; deleting an already-absent id is not an error
    pub fn delete_link(&self, id: u64) -> Result<()> {
        let query = format!("((({0}: $s $t)) ())", id);
        self.backend.invoke(&query, ReportFlags::changes())?;
        Ok(())
    }

    /// Delete every link, one backend round-trip per link.
    ///
    /// Not atomic: an interruption leaves the backend partially cleared.
    pub fn clear(&self) -> Result<()> {
        let links = self.all_links()?;
        info!(count = links.len(), "clearing link backend");
        for link in links {
            self.delete_link(link.id)?;
        }
        Ok(())
    }

    // === Flat menu entries ===

    /// Record a flat menu entry under the menu tag.
    ///
    /// Predates the blob-backed hierarchy in `MenuStore`: entries carry
    /// no payload, only `(n, MENU_ENTRY_TAG)` with `n` drawn from a
    /// counter owned by this instance.
    pub fn store_menu_entry(&self) -> Result<Link> {
        let entry_id = {
            let mut next = self.next_entry_id.lock();
            let id = *next;
            *next += 1;
            id
        };
        self.create_link(entry_id, MENU_ENTRY_TAG)
    }

    /// Every link carrying the menu tag
    pub fn menu_entries(&self) -> Result<Vec<Link>> {
        Ok(self
            .all_links()?
            .into_iter()
            .filter(|l| l.target == MENU_ENTRY_TAG)
            .collect())
    }

    /// Remove a flat menu entry by its link id
    pub fn delete_menu_entry(&self, link_id: u64) -> Result<()> {
        self.delete_link(link_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn store() -> LinkStore {
        LinkStore::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn test_create_assigns_backend_id() {
        let links = store();
        let link = links.create_link(100, 200).unwrap();
        assert_eq!((link.source, link.target), (100, 200));

        let all = links.all_links().unwrap();
        assert_eq!(all, vec![link]);
    }

    #[test]
    fn test_get_link_absence_is_none() {
        let links = store();
        assert_eq!(links.get_link(99).unwrap(), None);
    }

    #[test]
    fn test_update_leaves_other_links_alone() {
        let links = store();
        let first = links.create_link(100, 200).unwrap();
        let second = links.create_link(300, 400).unwrap();

        let updated = links.update_link(first.id, 100, 500).unwrap();
        assert_eq!(updated, Link::new(first.id, 100, 500));

        assert_eq!(links.get_link(first.id).unwrap(), Some(updated));
        assert_eq!(links.get_link(second.id).unwrap(), Some(second));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let links = store();
        let link = links.create_link(1, 2).unwrap();

        links.delete_link(link.id).unwrap();
        links.delete_link(link.id).unwrap();
        assert_eq!(links.get_link(link.id).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let links = store();
        links.create_link(1, 2).unwrap();
        links.create_link(3, 4).unwrap();

        links.clear().unwrap();
        assert!(links.all_links().unwrap().is_empty());
    }

    #[test]
    fn test_parser_tolerates_noise() {
        let links = store();
        let output = "\n  (1: 100 200)  \nnot a link\n(oops: 1 2)\n\n(2: 300 400)";
        assert_eq!(
            links.parse_links(output),
            vec![Link::new(1, 100, 200), Link::new(2, 300, 400)]
        );
    }

    #[test]
    fn test_menu_entries_counter_is_instance_state() {
        let links = store();
        let a = links.store_menu_entry().unwrap();
        let b = links.store_menu_entry().unwrap();
        assert_eq!((a.source, b.source), (1, 2));

        // A fresh store starts its own sequence
        let other = store();
        let c = other.store_menu_entry().unwrap();
        assert_eq!(c.source, 1);

        assert_eq!(links.menu_entries().unwrap().len(), 2);
        links.delete_menu_entry(a.id).unwrap();
        assert_eq!(links.menu_entries().unwrap().len(), 1);
    }
}
