//! Menu hierarchy over links and blobs
//!
//! A node is one blob (its content, children stripped) plus one link
//! `(itemId, parentId)`; root-level nodes hang off the reserved parent
//! `0`. Item ids are content-derived, so re-storing an identical item is
//! an upsert: the blob write is a no-op overwrite and the link is only
//! created if `(itemId, parentId)` is not already present.
//!
//! Trees are rebuilt by scanning the link set and joining each link's
//! source to its blob. The two substrates share no transaction, so a
//! dangling link (blob missing) is skipped on read rather than treated
//! as an error, and `reconcile` can sweep the divergence away.

use crate::backend::Backend;
use crate::ident;
use crate::model::{strip_children, Link, MenuNode, CHILDREN_FIELD};
use crate::stats::{MenuStats, ReconcileReport};
use crate::store::{BlobStore, LinkStore, Namespace};
use crate::{Result, ROOT_PARENT};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Store for hierarchical menu structures
pub struct MenuStore {
    links: LinkStore,
    blobs: BlobStore,
}

impl MenuStore {
    /// Open a menu store over the given blob root and backend
    pub fn open(root: impl AsRef<Path>, backend: Box<dyn Backend>) -> Result<Self> {
        Ok(MenuStore {
            links: LinkStore::new(backend),
            blobs: BlobStore::open(root)?,
        })
    }

    /// The underlying link client
    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    /// The underlying blob store
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Store one item under a parent; returns its content-derived id.
    ///
    /// Any children under `items` are stripped from the stored content;
    /// only the link graph knows the tree shape.
    pub fn store_item(&self, item: &Value, parent_id: u64) -> Result<u64> {
        let stripped = strip_children(item);
        let item_id = ident::generate_item_id(item);

        self.blobs
            .save(Namespace::MenuItems, &item_id.to_string(), &stripped)?;

        let exists = self
            .links
            .all_links()?
            .iter()
            .any(|l| l.source == item_id && l.target == parent_id);
        if exists {
            debug!(item_id, parent_id, "item link already present, content upsert");
        } else {
            self.links.create_link(item_id, parent_id)?;
            info!(item_id, parent_id, "menu item stored");
        }

        Ok(item_id)
    }

    /// Store a forest recursively under a parent.
    ///
    /// Returns item ids in pre-order: each parent before its children,
    /// siblings in input order.
    pub fn store_tree(&self, items: &[Value], parent_id: u64) -> Result<Vec<u64>> {
        let mut ids = Vec::new();

        for item in items {
            let item_id = self.store_item(item, parent_id)?;
            ids.push(item_id);

            if let Some(children) = item.get(CHILDREN_FIELD).and_then(Value::as_array) {
                if !children.is_empty() {
                    ids.extend(self.store_tree(children, item_id)?);
                }
            }
        }

        Ok(ids)
    }

    /// Materialize the forest under a parent (`ROOT_PARENT` for the
    /// whole menu).
    ///
    /// Links whose blob is missing are skipped rather than failing the
    /// read. Sibling order follows the backend's enumeration order for
    /// this call and is not guaranteed stable across calls.
    pub fn tree(&self, parent_id: u64) -> Result<Vec<MenuNode>> {
        let all = self.links.all_links()?;
        let mut path = HashSet::new();
        self.tree_from(&all, parent_id, &mut path)
    }

    fn tree_from(
        &self,
        links: &[Link],
        parent_id: u64,
        path: &mut HashSet<u64>,
    ) -> Result<Vec<MenuNode>> {
        let mut nodes = Vec::new();

        for link in links.iter().filter(|l| l.target == parent_id) {
            let item_id = link.source;

            // A looping link set would otherwise recurse forever
            if path.contains(&item_id) {
                warn!(item_id, parent_id, "skipping link cycle");
                continue;
            }

            let content = match self.blobs.load(Namespace::MenuItems, &item_id.to_string())? {
                Some(Value::Object(map)) => map,
                Some(_) => {
                    warn!(item_id, "skipping non-object item blob");
                    continue;
                }
                None => {
                    debug!(item_id, link_id = link.id, "skipping link with missing blob");
                    continue;
                }
            };

            path.insert(item_id);
            let children = self.tree_from(links, item_id, path)?;
            path.remove(&item_id);

            nodes.push(MenuNode {
                link_id: link.id,
                item_id,
                parent_id: None,
                content,
                children,
            });
        }

        Ok(nodes)
    }

    /// Flat listing of every stored item joined to its link
    pub fn all_items(&self) -> Result<Vec<MenuNode>> {
        let mut items = Vec::new();

        for link in self.links.all_links()? {
            match self.blobs.load(Namespace::MenuItems, &link.source.to_string())? {
                Some(Value::Object(content)) => items.push(MenuNode {
                    link_id: link.id,
                    item_id: link.source,
                    parent_id: Some(link.target),
                    content,
                    children: Vec::new(),
                }),
                Some(_) => warn!(item_id = link.source, "skipping non-object item blob"),
                None => {}
            }
        }

        Ok(items)
    }

    /// Delete an item and its whole subtree, children first.
    ///
    /// Best-effort: a failure on one descendant is logged and does not
    /// abort deletion of its siblings or the parent.
    pub fn delete_item(&self, item_id: u64) -> Result<()> {
        for child in self.tree(item_id)? {
            if let Err(e) = self.delete_item(child.item_id) {
                warn!(item_id = child.item_id, error = %e, "failed to delete child item");
            }
        }

        match self.links.all_links() {
            Ok(all) => {
                for link in all.iter().filter(|l| l.source == item_id) {
                    if let Err(e) = self.links.delete_link(link.id) {
                        warn!(link_id = link.id, error = %e, "failed to delete item link");
                    }
                }
            }
            Err(e) => warn!(item_id, error = %e, "failed to enumerate links for delete"),
        }

        if let Err(e) = self.blobs.delete(Namespace::MenuItems, &item_id.to_string()) {
            warn!(item_id, error = %e, "failed to delete item blob");
        }

        info!(item_id, "menu item deleted");
        Ok(())
    }

    /// Remove every menu link and blob
    pub fn clear(&self) -> Result<()> {
        self.links.clear()?;
        self.blobs.clear(Namespace::MenuItems)?;
        Ok(())
    }

    /// Derived counts over both substrates, computed on demand
    pub fn stats(&self) -> Result<MenuStats> {
        let links = self.links.all_links()?;
        Ok(MenuStats {
            total_links: links.len() as u64,
            total_files: self.blobs.count(Namespace::MenuItems) as u64,
            root_items: links.iter().filter(|l| l.target == ROOT_PARENT).count() as u64,
        })
    }

    /// Remove dangling links (no blob behind the source) and orphan
    /// blobs (no link with the blob's id as source).
    ///
    /// The pass is best-effort and non-atomic, like the writes whose
    /// partial failures it repairs: per-item failures are logged and the
    /// sweep continues.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let links = self.links.all_links()?;
        let blobs = self.blobs.list(Namespace::MenuItems)?;

        let blob_ids: HashSet<&str> = blobs.iter().map(|(id, _)| id.as_str()).collect();
        let link_sources: HashSet<String> =
            links.iter().map(|l| l.source.to_string()).collect();

        let mut report = ReconcileReport::default();

        for link in &links {
            if !blob_ids.contains(link.source.to_string().as_str()) {
                match self.links.delete_link(link.id) {
                    Ok(()) => {
                        info!(link_id = link.id, item_id = link.source, "removed dangling link");
                        report.removed_links += 1;
                    }
                    Err(e) => warn!(link_id = link.id, error = %e, "failed to remove dangling link"),
                }
            }
        }

        for (id, _) in &blobs {
            if !link_sources.contains(id) {
                match self.blobs.delete(Namespace::MenuItems, id) {
                    Ok(()) => {
                        info!(item_id = %id, "removed orphan blob");
                        report.removed_blobs += 1;
                    }
                    Err(e) => warn!(item_id = %id, error = %e, "failed to remove orphan blob"),
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> MenuStore {
        MenuStore::open(dir, Box::new(MemoryBackend::new())).unwrap()
    }

    fn sample_menu() -> Vec<Value> {
        vec![
            json!({
                "label": "Home",
                "icon": "house",
                "to": "/"
            }),
            json!({
                "label": "Admin",
                "icon": "gear",
                "items": [
                    {"label": "Users", "to": "/admin/users"},
                    {"label": "Settings", "to": "/admin/settings"}
                ]
            }),
        ]
    }

    #[test]
    fn test_store_tree_returns_preorder_ids() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        let ids = store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], ident::generate_item_id(&sample_menu()[0]));
        assert_eq!(ids[1], ident::generate_item_id(&sample_menu()[1]));
    }

    #[test]
    fn test_roundtrip_preserves_structure() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        let forest = store.tree(ROOT_PARENT).unwrap();

        assert_eq!(forest.len(), 2);
        let admin = forest
            .iter()
            .find(|n| n.get_str("label") == Some("Admin"))
            .unwrap();
        assert_eq!(admin.children.len(), 2);
        assert!(admin.get("items").is_none(), "children live on the node, not in content");

        let home = forest
            .iter()
            .find(|n| n.get_str("label") == Some("Home"))
            .unwrap();
        assert!(home.children.is_empty());
        assert_eq!(home.get_str("to"), Some("/"));
    }

    #[test]
    fn test_restore_is_upsert() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_links, 4);
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.root_items, 2);
    }

    #[test]
    fn test_dangling_link_skipped_on_read() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        // A link whose blob never made it to disk
        store.links().create_link(999_999, ROOT_PARENT).unwrap();

        let forest = store.tree(ROOT_PARENT).unwrap();
        assert_eq!(forest.len(), 2);
    }

    #[test]
    fn test_delete_item_removes_subtree() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        let ids = store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        let admin_id = ids[1];

        store.delete_item(admin_id).unwrap();

        let forest = store.tree(ROOT_PARENT).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].get_str("label"), Some("Home"));

        // Children's blobs went too
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_links, 1);
    }

    #[test]
    fn test_all_items_is_flat() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        let items = store.all_items().unwrap();

        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|n| n.children.is_empty()));
        assert!(items.iter().all(|n| n.parent_id.is_some()));
    }

    #[test]
    fn test_clear_empties_both_substrates() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();
        store.clear().unwrap();

        assert_eq!(store.stats().unwrap(), MenuStats::default());
    }

    #[test]
    fn test_reconcile_sweeps_divergence() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store_tree(&sample_menu(), ROOT_PARENT).unwrap();

        // Plant one of each kind of divergence
        store.links().create_link(424_242, ROOT_PARENT).unwrap();
        store
            .blobs()
            .save(Namespace::MenuItems, "313131", &json!({"label": "Ghost"}))
            .unwrap();

        let report = store.reconcile().unwrap();
        assert_eq!(report.removed_links, 1);
        assert_eq!(report.removed_blobs, 1);

        // A consistent store reconciles to zeroes
        assert_eq!(store.reconcile().unwrap(), ReconcileReport::default());
    }
}
