use std::path::PathBuf;

use sfconfig_types::{ErrorKind, TreeError};

/// Errors raised by the profile loader and the virtual field layer.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A virtual field's physical attributes are absent in this tree.
    #[error("{field} is not supported in this config version")]
    Unsupported { field: String },

    #[error("Invalid rendering mode: {0}")]
    InvalidRenderingMode(String),

    /// Bad rule input or a value the physical layout cannot hold.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("failed to read profile {path}: {source}")]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile: {0}")]
    ProfileParse(#[from] toml::de::Error),
}

impl SchemaError {
    pub fn unsupported(field: impl Into<String>) -> Self {
        Self::Unsupported {
            field: field.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported { .. } | Self::InvalidRenderingMode(_) | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::Tree(err) => err.kind(),
            Self::ProfileIo { .. } => ErrorKind::Io,
            Self::ProfileParse(_) => ErrorKind::Parse,
        }
    }
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
