//! Tree file encodings.
//!
//! Binary format:
//! ```text
//! [4 bytes: magic "SFCT"]
//! [1 byte: format version]
//! [32 bytes: BLAKE3 digest of payload]
//! [N bytes: payload (bincode-serialized ConfigTree)]
//! ```
//!
//! Files with a `.json` extension hold the same tree as pretty-printed
//! JSON, without framing. Both are validated after decoding.

use std::path::Path;

use sfconfig_types::ConfigTree;

use crate::error::{StoreError, StoreResult};

pub const MAGIC: &[u8; 4] = b"SFCT";
pub const FORMAT_VERSION: u8 = 1;

/// Magic + version + digest.
const HEADER_SIZE: usize = 4 + 1 + 32;

/// How a tree file is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Json,
}

impl Encoding {
    /// `.json` files are JSON; everything else is binary.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Binary,
        }
    }

    pub fn encode(self, tree: &ConfigTree) -> StoreResult<Vec<u8>> {
        match self {
            Self::Binary => encode_binary(tree),
            Self::Json => {
                serde_json::to_vec_pretty(tree).map_err(|e| StoreError::Encode(e.to_string()))
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> StoreResult<ConfigTree> {
        let tree: ConfigTree = match self {
            Self::Binary => decode_binary(bytes)?,
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))?
            }
        };
        tree.validate()?;
        Ok(tree)
    }
}

fn encode_binary(tree: &ConfigTree) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(tree).map_err(|e| StoreError::Encode(e.to_string()))?;
    let digest = blake3::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(digest.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

fn decode_binary(bytes: &[u8]) -> StoreResult<ConfigTree> {
    if bytes.len() < HEADER_SIZE {
        if !bytes.starts_with(MAGIC) {
            return Err(StoreError::BadMagic);
        }
        return Err(StoreError::Truncated { len: bytes.len() });
    }
    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(StoreError::BadMagic);
    }
    let (version, rest) = rest.split_at(1);
    if version[0] != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(version[0]));
    }
    let (expected, payload) = rest.split_at(32);

    let computed = blake3::hash(payload);
    if computed.as_bytes().as_slice() != expected {
        return Err(StoreError::DigestMismatch {
            expected: hex::encode(expected),
            computed: computed.to_hex().to_string(),
        });
    }
    bincode::deserialize(payload).map_err(|e| StoreError::Decode(e.to_string()))
}
