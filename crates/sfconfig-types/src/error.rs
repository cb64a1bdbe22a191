use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::NodeId;

/// Error classification shared by every sfconfig crate.
///
/// Each crate's error enum maps onto one of these kinds; the CLI reports the
/// kind as `errorType` and derives its exit code from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input, disallowed field, bad enum/type/op, unresolvable path.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Persistence-layer failure.
    #[serde(rename = "IO_ERROR")]
    Io,
    /// Malformed tree or malformed patch document.
    #[serde(rename = "PARSE_ERROR")]
    Parse,
    /// Any unexpected internal fault.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ErrorKind {
    /// The wire name reported as `errorType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Io => "IO_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Process exit code for this kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation => 1,
            Self::Io => 2,
            Self::Parse => 3,
            Self::Unknown => 99,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node handle out of range: {0}")]
    DanglingNode(NodeId),

    #[error("type not registered: {0}")]
    UnknownType(String),

    #[error("attribute {attr} not declared on {type_name}")]
    UnknownAttribute { type_name: String, attr: String },

    #[error("node {node} of type {type_name} has {actual} slots, expected {expected}")]
    SlotCount {
        node: NodeId,
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// Handles are `u32`; the arena cannot grow past that.
    #[error("node arena is full at {0} nodes")]
    ArenaFull(usize),
}

impl TreeError {
    /// Tree errors surface while reading a persisted tree or addressing a
    /// slot; both are caller-side faults of different kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAttribute { .. } => ErrorKind::Validation,
            Self::ArenaFull(_) => ErrorKind::Unknown,
            _ => ErrorKind::Parse,
        }
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
