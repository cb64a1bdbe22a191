//! Storage for sfconfig trees.
//!
//! Config trees persist either as checksummed binary files (bincode payload
//! behind a BLAKE3 digest) or as plain JSON. Every load validates the tree
//! before handing it out.
//!
//! # Key Types
//!
//! - [`TreeStore`] -- Trait for load/save backends
//! - [`FileTreeStore`] -- Filesystem backend with atomic replace
//! - [`InMemoryTreeStore`] -- Path-keyed in-memory backend
//! - [`Encoding`] -- Binary or JSON, chosen by file extension
//! - [`StoreError`] -- Storage failures, each mapped to an error kind

pub mod error;
pub mod file;
pub mod format;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileTreeStore;
pub use format::Encoding;
pub use memory::InMemoryTreeStore;
pub use traits::TreeStore;
