//! Allowlisted patching of crawler config trees.
//!
//! A patch document maps logical paths to edits. Scalar edits are coerced
//! to the slot's declared type, list edits take a small op language, and
//! rule collections take ordered `add` / `remove` / `clear` ops. Every
//! changed field yields one [`ChangeRecord`](sfconfig_types::ChangeRecord).
//!
//! # Key Types
//!
//! - [`PatchEngine`] -- Applies a [`PatchSet`] to a tree, all or nothing
//! - [`PatchSet`] -- Ordered patch document
//! - [`PatchOutcome`] -- Change records plus warnings
//! - [`ListPatch`] -- Parsed list edit
//! - [`PatchError`] -- Patch failures, each mapped to an error kind

pub mod coerce;
pub mod collections;
pub mod engine;
pub mod error;
pub mod list;

pub use coerce::coerce;
pub use engine::{PatchEngine, PatchOutcome, PatchSet};
pub use error::{PatchError, PatchResult};
pub use list::ListPatch;
