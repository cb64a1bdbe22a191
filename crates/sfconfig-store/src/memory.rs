use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sfconfig_types::ConfigTree;

use crate::error::{StoreError, StoreResult};
use crate::format::Encoding;
use crate::traits::TreeStore;

/// In-memory tree store keyed by path.
///
/// Trees are held encoded, exactly as [`FileTreeStore`](crate::FileTreeStore)
/// would write them, so loads exercise the same decoding and validation.
pub struct InMemoryTreeStore {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored trees.
    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }

    /// Store raw bytes at `path` without encoding.
    pub fn insert_raw(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.into(), bytes);
    }

    /// Raw bytes stored at `path`.
    pub fn raw(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().expect("lock poisoned").get(path).cloned()
    }
}

impl Default for InMemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore for InMemoryTreeStore {
    fn load(&self, path: &Path) -> StoreResult<ConfigTree> {
        let files = self.files.read().expect("lock poisoned");
        let bytes = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        Encoding::for_path(path).decode(bytes)
    }

    fn save(&self, path: &Path, tree: &ConfigTree) -> StoreResult<()> {
        let bytes = Encoding::for_path(path).encode(tree)?;
        self.insert_raw(path, bytes);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().expect("lock poisoned").contains_key(path)
    }
}
