use std::path::Path;

use serde_json::{Map, Value as Json};
use sfconfig_patch::PatchError;
use sfconfig_schema::SchemaError;
use sfconfig_store::StoreError;
use sfconfig_types::ErrorKind;

/// A failure reported to the caller as the error envelope.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Map<String, Json>,
}

impl CliError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Recover the envelope from an error at the binary edge.
    ///
    /// Anything that is not already a `CliError` is an unexpected fault.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<CliError>() {
            Ok(err) => err,
            Err(other) => Self::new(ErrorKind::Unknown, "Unexpected error")
                .with_detail("exception", other.to_string())
                .with_detail("message", other.root_cause().to_string()),
        }
    }

    /// A store failure while reading the config at `path`.
    pub fn reading(path: &Path, err: StoreError) -> Self {
        match (&err, err.kind()) {
            (StoreError::NotFound(_), _) => Self::io(err.to_string()),
            (_, ErrorKind::Io) => Self::io(format!("Unable to read config: {}", path.display()))
                .with_detail("reason", err.to_string()),
            (_, kind) => Self::new(kind, format!("Invalid config file: {}", path.display()))
                .with_detail("reason", err.to_string()),
        }
    }

    /// A store failure while writing the config at `path`.
    pub fn writing(path: &Path, err: StoreError) -> Self {
        Self::new(err.kind(), format!("Unable to write config: {}", path.display()))
            .with_detail("reason", err.to_string())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl From<PatchError> for CliError {
    fn from(err: PatchError) -> Self {
        Self {
            kind: err.kind(),
            details: err.details(),
            message: err.to_string(),
        }
    }
}

impl From<SchemaError> for CliError {
    fn from(err: SchemaError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_error_survives_anyhow() {
        let err = anyhow::Error::from(CliError::validation("Empty path"));
        let back = CliError::from_anyhow(err);
        assert_eq!(back.kind, ErrorKind::Validation);
        assert_eq!(back.message, "Empty path");
        assert!(back.details.is_empty());
    }

    #[test]
    fn foreign_errors_become_unknown() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = anyhow::Error::from(io).context("writing report");
        let back = CliError::from_anyhow(err);
        assert_eq!(back.kind, ErrorKind::Unknown);
        assert_eq!(back.exit_code(), 99);
        assert_eq!(back.message, "Unexpected error");
        assert_eq!(back.details["exception"], "writing report");
        assert_eq!(back.details["message"], "disk on fire");
    }

    #[test]
    fn store_errors_keep_their_kind() {
        let path = PathBuf::from("/tmp/a.seospiderconfig");
        let missing = CliError::reading(&path, StoreError::NotFound(path.clone()));
        assert_eq!(missing.kind, ErrorKind::Io);
        assert_eq!(missing.message, "File not found: /tmp/a.seospiderconfig");

        let corrupt = CliError::reading(&path, StoreError::BadMagic);
        assert_eq!(corrupt.kind, ErrorKind::Parse);
        assert_eq!(corrupt.exit_code(), 3);
        assert_eq!(corrupt.message, "Invalid config file: /tmp/a.seospiderconfig");
        assert!(corrupt.details.contains_key("reason"));
    }

    #[test]
    fn disallowed_field_carries_allowed_list() {
        let err = CliError::from(PatchError::NotAllowed {
            path: "mFoo".into(),
            allowed_fields: vec!["mCrawlConfig.mMaxDepth".into()],
        });
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Field not allowed: mFoo");
        assert_eq!(err.details["allowedFields"], serde_json::json!(["mCrawlConfig.mMaxDepth"]));
    }
}
