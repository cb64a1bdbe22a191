//! Foundation types for sfconfig.
//!
//! This crate provides the arena-backed configuration tree, the per-tree type
//! registry that describes its physical layout, and the logical field and
//! change-record types shared by the walker, patch and diff engines. Every
//! other sfconfig crate depends on `sfconfig-types`.
//!
//! # Key Types
//!
//! - [`ConfigTree`] -- Arena of typed nodes addressed by [`NodeId`] handles
//! - [`TypeRegistry`] -- Ordered attribute layouts ([`TypeDef`]) and enums ([`EnumDef`])
//! - [`Value`] / [`AttrType`] -- Tagged slot values and declared slot types
//! - [`FieldInfo`] / [`FieldMap`] -- Logical field descriptions keyed by dotted path
//! - [`ChangeRecord`] -- Before/after pair for a changed field
//! - [`ErrorKind`] -- Error classification reported to callers

pub mod error;
pub mod field;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod registry;
pub mod tree;
pub mod value;

pub use error::{ErrorKind, TreeError, TreeResult};
pub use field::{ChangeRecord, FieldInfo, FieldMap, FieldType};
pub use registry::{simple_name, AttrDef, EnumDef, TypeDef, TypeRegistry};
pub use tree::{ConfigTree, Node, NodeId};
pub use value::{AttrType, Primitive, Value};
