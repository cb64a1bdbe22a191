use std::path::PathBuf;

use sfconfig_types::{ErrorKind, TreeError};

/// Errors from loading or saving a config tree.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error from the filesystem.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not start with the tree magic.
    #[error("not an sfconfig tree file: bad magic")]
    BadMagic,

    #[error("unsupported tree format version {0}")]
    UnsupportedVersion(u8),

    /// The file ends before the header does.
    #[error("tree file truncated: {len} bytes")]
    Truncated { len: usize },

    /// Payload digest mismatch (data corruption).
    #[error("digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },

    /// The payload could not be decoded.
    #[error("malformed tree: {0}")]
    Decode(String),

    /// The decoded tree is structurally inconsistent.
    #[error("malformed tree: {0}")]
    Invalid(#[from] TreeError),

    /// The tree could not be encoded.
    #[error("serialization error: {0}")]
    Encode(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::Io { .. } => ErrorKind::Io,
            Self::BadMagic
            | Self::UnsupportedVersion(_)
            | Self::Truncated { .. }
            | Self::DigestMismatch { .. }
            | Self::Decode(_)
            | Self::Invalid(_) => ErrorKind::Parse,
            Self::Encode(_) => ErrorKind::Unknown,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
