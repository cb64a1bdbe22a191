//! Diff engine for sfconfig.
//!
//! Compares two config trees through the logical view: scalar and enum
//! fields by value, list fields as sets of item text.
//!
//! # Key Types
//!
//! - [`FieldsDiff`] / [`FieldDiff`] -- Field-level diff over two field maps
//! - [`ListDelta`] -- Added / removed / unchanged items of a list field
//! - [`diff_trees`] -- Walk both trees and diff their logical fields

pub mod field_diff;
pub mod list_diff;
pub mod tree_diff;

pub use field_diff::{diff_fields, FieldDiff, FieldsDiff};
pub use list_diff::{diff_lists, ListDelta};
pub use tree_diff::diff_trees;
