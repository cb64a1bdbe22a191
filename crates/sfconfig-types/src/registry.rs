//! Per-type registration table.
//!
//! Every node in a [`crate::ConfigTree`] names a registered [`TypeDef`]; the
//! type definition fixes the ordered attribute layout of the node's slots.
//! Registries travel with the tree, so two trees written by different
//! application releases can disagree on any layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::AttrType;

/// A named attribute in a type's layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrDef {
    pub name: String,
    pub ty: AttrType,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, ty: AttrType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An object type: fully qualified name plus ordered attributes.
///
/// Inherited attributes are flattened into `attrs` after the declaring
/// type's own, in lookup order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub attrs: Vec<AttrDef>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, attrs: Vec<AttrDef>) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    /// Slot index of the named attribute.
    pub fn position(&self, attr: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.name == attr)
    }

    /// Declared attribute by name.
    pub fn attr(&self, attr: &str) -> Option<&AttrDef> {
        self.attrs.iter().find(|a| a.name == attr)
    }

    /// The last dot-separated segment of the type name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// An enum type and its member names in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumDef {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive member lookup, returning the canonical spelling.
    pub fn find_member(&self, candidate: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.eq_ignore_ascii_case(candidate))
            .map(String::as_str)
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

/// Registered object and enum types of one tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDef>,
    enums: BTreeMap<String, EnumDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an object type.
    pub fn register_type(&mut self, def: TypeDef) -> &mut Self {
        self.types.insert(def.name.clone(), def);
        self
    }

    /// Register (or replace) an enum type.
    pub fn register_enum(&mut self, def: EnumDef) -> &mut Self {
        self.enums.insert(def.name.clone(), def);
        self
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered object types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

/// The last dot-separated segment of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
