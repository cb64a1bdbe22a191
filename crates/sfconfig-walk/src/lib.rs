//! Field discovery over a config tree.
//!
//! A bounded, cycle-safe walk turns the physical object graph into dotted
//! paths with type tags and JSON values. [`logical_fields`] then overlays
//! the virtual fields and rule collections so callers see one stable
//! logical schema regardless of release layout.
//!
//! # Key Types
//!
//! - [`walk`] / [`walk_tree`] -- Physical depth-first walk
//! - [`logical_fields`] -- Walk plus virtual overlay plus editability
//! - [`filter_prefix`] -- Plain prefix filter over a field map

pub mod logical;
pub mod walker;

pub use logical::{filter_prefix, logical_fields};
pub use walker::{walk, walk_tree};
