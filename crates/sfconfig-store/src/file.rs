use std::io::Write;
use std::path::Path;

use sfconfig_types::ConfigTree;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::format::Encoding;
use crate::traits::TreeStore;

/// Filesystem-backed tree store.
///
/// The encoding follows the file extension (see [`Encoding::for_path`]).
/// Saves go through a temporary file in the target directory that is then
/// renamed over the destination.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileTreeStore;

impl FileTreeStore {
    pub fn new() -> Self {
        Self
    }
}

impl TreeStore for FileTreeStore {
    fn load(&self, path: &Path) -> StoreResult<ConfigTree> {
        if !path.is_file() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let encoding = Encoding::for_path(path);
        let tree = encoding.decode(&bytes)?;
        debug!(
            path = %path.display(),
            ?encoding,
            bytes = bytes.len(),
            nodes = tree.len(),
            "loaded config tree"
        );
        Ok(tree)
    }

    fn save(&self, path: &Path, tree: &ConfigTree) -> StoreResult<()> {
        let encoding = Encoding::for_path(path);
        let bytes = encoding.encode(tree)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(&bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

        debug!(path = %path.display(), ?encoding, bytes = bytes.len(), "saved config tree");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
