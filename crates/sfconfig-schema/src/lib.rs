//! Schema knowledge for sfconfig.
//!
//! The physical layout of a crawler config drifts between releases. This
//! crate holds what is known about it: the [`SchemaProfile`] (edit
//! allowlists, sensitive keys, walker exclusions, attribute aliases) and the
//! [`VirtualLayer`], which presents stable logical fields over physical
//! attributes that may be renamed, split or absent.
//!
//! # Key Types
//!
//! - [`SchemaProfile`] -- Immutable schema configuration, loadable from TOML
//! - [`VirtualLayer`] / [`VirtualField`] -- Derived field getters and setters
//! - [`CrawlLimit`] -- Max URLs / max depth over a flag plus a cap
//! - [`RuleKind`] / [`RuleCatalog`] / [`RuleList`] -- Rule collections and their versioned layouts

pub mod access;
pub mod error;
pub mod exclude;
pub mod layer;
pub mod limits;
pub mod profile;
pub mod rendering;
pub mod rules;

pub use error::{SchemaError, SchemaResult};
pub use layer::{VirtualField, VirtualLayer};
pub use limits::CrawlLimit;
pub use profile::{CollectionBinding, Exclusion, SchemaProfile};
pub use rules::{
    CustomJavaScript, CustomSearch, ExtractionRule, RuleCatalog, RuleKind, RuleList, RuleRecord,
    RuleShape,
};
