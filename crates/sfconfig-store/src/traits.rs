use std::path::Path;

use sfconfig_types::ConfigTree;

use crate::error::StoreResult;

/// Where config trees are loaded from and saved to.
///
/// Implementations must satisfy these invariants:
/// - `load` returns a tree that passed [`ConfigTree::validate`].
/// - `save` never leaves a partially written tree at `path`.
/// - A missing source is [`StoreError::NotFound`](crate::StoreError::NotFound),
///   not a generic I/O error.
pub trait TreeStore: Send + Sync {
    /// Load and validate the tree stored at `path`.
    fn load(&self, path: &Path) -> StoreResult<ConfigTree>;

    /// Save `tree` to `path`, replacing whatever was there.
    fn save(&self, path: &Path, tree: &ConfigTree) -> StoreResult<()>;

    /// Check whether a tree is stored at `path`.
    fn exists(&self, path: &Path) -> bool;
}
