//! Namespaced JSON blob storage
//!
//! One directory per namespace, one pretty-printed `<id>.json` file per
//! entity. There is no locking: concurrent writers to the same id race
//! and the last write wins.

use crate::Result;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Logical namespace for stored blobs, one per entity kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Users,
    Tokens,
    Passwords,
    MenuItems,
    Generic,
}

impl Namespace {
    /// Directory name under the store root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Namespace::Users => "users",
            Namespace::Tokens => "tokens",
            Namespace::Passwords => "passwords",
            Namespace::MenuItems => "menu-items",
            Namespace::Generic => "generic",
        }
    }
}

/// Filesystem store for JSON documents
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open a store rooted at the given directory, creating it on demand
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(BlobStore { root })
    }

    /// Store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.dir_name())
    }

    fn file_path(&self, namespace: Namespace, id: &str) -> PathBuf {
        self.dir(namespace).join(format!("{}.json", id))
    }

    /// Write a document, overwriting any previous content
    pub fn save(&self, namespace: Namespace, id: &str, doc: &Value) -> Result<()> {
        fs::create_dir_all(self.dir(namespace))?;
        fs::write(
            self.file_path(namespace, id),
            serde_json::to_string_pretty(doc)?,
        )?;
        Ok(())
    }

    /// Read a document; a missing file is `None`, not an error
    pub fn load(&self, namespace: Namespace, id: &str) -> Result<Option<Value>> {
        let data = match fs::read_to_string(self.file_path(namespace, id)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Delete a document; a missing file is tolerated
    pub fn delete(&self, namespace: Namespace, id: &str) -> Result<()> {
        match fs::remove_file(self.file_path(namespace, id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(namespace = namespace.dir_name(), id, "blob already absent on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every document in a namespace as `(id, doc)` pairs.
    ///
    /// Full directory scan; files that fail to read or parse are skipped
    /// with a warning.
    pub fn list(&self, namespace: Namespace) -> Result<Vec<(String, Value)>> {
        let entries = match fs::read_dir(self.dir(namespace)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(id) => id.to_string(),
                None => continue,
            };

            let parsed = fs::read_to_string(&path)
                .map_err(crate::Error::from)
                .and_then(|data| serde_json::from_str(&data).map_err(crate::Error::from));
            match parsed {
                Ok(doc) => docs.push((id, doc)),
                Err(e) => {
                    warn!(namespace = namespace.dir_name(), id = %id, error = %e, "skipping unreadable blob")
                }
            }
        }
        Ok(docs)
    }

    /// Number of documents in a namespace
    pub fn count(&self, namespace: Namespace) -> usize {
        match fs::read_dir(self.dir(namespace)) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
                .count(),
            Err(_) => 0,
        }
    }

    /// Delete every document in a namespace; per-file failures are
    /// logged and do not abort the sweep
    pub fn clear(&self, namespace: Namespace) -> Result<()> {
        for (id, _) in self.list(namespace)? {
            if let Err(e) = self.delete(namespace, &id) {
                warn!(namespace = namespace.dir_name(), id = %id, error = %e, "failed to delete blob");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        let doc = json!({"label": "Home", "icon": "house"});
        store.save(Namespace::MenuItems, "42", &doc).unwrap();

        let loaded = store.load(Namespace::MenuItems, "42").unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        store.save(Namespace::Generic, "k", &json!({"v": 1})).unwrap();
        store.save(Namespace::Generic, "k", &json!({"v": 2})).unwrap();

        assert_eq!(store.load(Namespace::Generic, "k").unwrap(), Some(json!({"v": 2})));
        assert_eq!(store.count(Namespace::Generic), 1);
    }

    #[test]
    fn test_missing_is_absence() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        assert_eq!(store.load(Namespace::Users, "nope").unwrap(), None);
        // Deleting something that was never there is fine too
        store.delete(Namespace::Users, "nope").unwrap();
    }

    #[test]
    fn test_list_skips_unparsable() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        store.save(Namespace::Tokens, "good", &json!({"ok": true})).unwrap();
        std::fs::write(dir.path().join("tokens").join("bad.json"), "{not json").unwrap();

        let docs = store.list(Namespace::Tokens).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, "good");
    }

    #[test]
    fn test_pretty_printed_on_disk() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        store
            .save(Namespace::MenuItems, "1", &json!({"a": 1, "b": 2}))
            .unwrap();

        let raw =
            std::fs::read_to_string(dir.path().join("menu-items").join("1.json")).unwrap();
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_clear_empties_namespace() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();

        store.save(Namespace::Passwords, "1", &json!({})).unwrap();
        store.save(Namespace::Passwords, "2", &json!({})).unwrap();
        store.clear(Namespace::Passwords).unwrap();

        assert_eq!(store.count(Namespace::Passwords), 0);
    }
}
