use serde_json::{Map, Value as Json};
use sfconfig_schema::SchemaError;
use sfconfig_types::{ErrorKind, TreeError};

/// Errors that abort a patch. Any of these leaves the caller's tree
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The field is outside every allowlist.
    #[error("Field not allowed: {path}")]
    NotAllowed {
        path: String,
        allowed_fields: Vec<String>,
    },

    /// Bad value, op, path or shape supplied by the caller.
    #[error("{0}")]
    Validation(String),

    /// The patch document is not a JSON object.
    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl PatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAllowed { .. } | Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Schema(err) => err.kind(),
            Self::Tree(err) => err.kind(),
        }
    }

    /// Structured details for the error envelope; empty for most errors.
    pub fn details(&self) -> Map<String, Json> {
        let mut details = Map::new();
        if let Self::NotAllowed { allowed_fields, .. } = self {
            details.insert(
                "allowedFields".into(),
                Json::Array(allowed_fields.iter().cloned().map(Json::String).collect()),
            );
        }
        details
    }
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
