//! Attribute model: declared slot types and the tagged values stored in them.

use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Declared types
// ---------------------------------------------------------------------------

/// Primitive scalar kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

/// The declared type of an attribute slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    /// Non-nullable primitive.
    Prim(Primitive),
    /// Nullable wrapper around a primitive.
    Boxed(Primitive),
    /// Text.
    Str,
    /// Generic numeric wrapper (arbitrary precision, atomics).
    Number,
    /// Enum, by registered enum name.
    Enum(String),
    /// Ordered list; items are normally scalars.
    List,
    /// Generic key-value map; always treated as an opaque leaf.
    Map,
    /// Nested object, by registered type name.
    Object(String),
}

impl AttrType {
    /// Leaf-typed slots are reported by the walker even when null.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Prim(_) | Self::Boxed(_) | Self::Str | Self::Number | Self::Enum(_)
        )
    }

    /// Primitive slots never hold null.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Prim(_))
    }

    /// The value a freshly instantiated slot of this type holds.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Prim(Primitive::Bool) => Value::Bool(false),
            Self::Prim(Primitive::Char) => Value::Char('\0'),
            Self::Prim(Primitive::Byte) => Value::Byte(0),
            Self::Prim(Primitive::Short) => Value::Short(0),
            Self::Prim(Primitive::Int) => Value::Int(0),
            Self::Prim(Primitive::Long) => Value::Long(0),
            Self::Prim(Primitive::Float) => Value::Float(0.0),
            Self::Prim(Primitive::Double) => Value::Double(0.0),
            _ => Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A value held in an attribute slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Generic numeric wrapper.
    Number(f64),
    Str(String),
    /// Enum member, tagged with its enum's registered name.
    Enum { ty: String, member: String },
    List(Vec<Value>),
    /// Opaque key-value map, entries in stored order.
    Map(Vec<(String, Value)>),
    Object(NodeId),
}

impl Value {
    /// Convenience constructor for enum members.
    pub fn enum_member(ty: impl Into<String>, member: impl Into<String>) -> Self {
        Self::Enum {
            ty: ty.into(),
            member: member.into(),
        }
    }

    /// Convenience constructor for text.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Scalars, enums and maps are leaves; lists and objects are not.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view of any numeric value, truncating floating point.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Double(v) | Self::Number(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_i64().is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<NodeId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Member name for enums, text for everything rendered by
    /// [`Value::display_text`].
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Self::Enum { member, .. } => Some(member),
            _ => None,
        }
    }

    /// Text rendering used for list items and enum-like reads.
    ///
    /// Returns `None` for null. Objects render as `#<handle>`; the caller
    /// usually prefers [`crate::ConfigTree::stringify`], which includes the
    /// type name.
    pub fn display_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Char(c) => Some(c.to_string()),
            Self::Byte(v) => Some(v.to_string()),
            Self::Short(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Long(v) => Some(v.to_string()),
            Self::Float(v) => Some(format!("{v:?}")),
            Self::Double(v) | Self::Number(v) => Some(format!("{v:?}")),
            Self::Str(s) => Some(s.clone()),
            Self::Enum { member, .. } => Some(member.clone()),
            Self::List(items) => Some(format!(
                "[{}]",
                items
                    .iter()
                    .map(|v| v.display_text().unwrap_or_else(|| "null".into()))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::Map(entries) => Some(format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!(
                        "{k}={}",
                        v.display_text().unwrap_or_else(|| "null".into())
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::Object(id) => Some(format!("#{id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_defaults_are_zero() {
        assert_eq!(AttrType::Prim(Primitive::Int).default_value(), Value::Int(0));
        assert_eq!(
            AttrType::Prim(Primitive::Bool).default_value(),
            Value::Bool(false)
        );
        assert_eq!(AttrType::Boxed(Primitive::Int).default_value(), Value::Null);
        assert_eq!(AttrType::Str.default_value(), Value::Null);
    }

    #[test]
    fn leaf_classification() {
        assert!(AttrType::Enum("E".into()).is_leaf());
        assert!(AttrType::Number.is_leaf());
        assert!(!AttrType::List.is_leaf());
        assert!(!AttrType::Map.is_leaf());
        assert!(!AttrType::Object("a.B".into()).is_leaf());

        assert!(Value::Map(vec![]).is_leaf());
        assert!(!Value::List(vec![]).is_leaf());
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Short(7).as_i64(), Some(7));
        assert_eq!(Value::Double(2.9).as_i64(), Some(2));
        assert_eq!(Value::str("7").as_i64(), None);
        assert!(!Value::Bool(true).is_numeric());
    }

    #[test]
    fn display_text_renders_scalars() {
        assert_eq!(Value::Double(1.0).display_text().as_deref(), Some("1.0"));
        assert_eq!(
            Value::enum_member("Mode", "RENDER").display_text().as_deref(),
            Some("RENDER")
        );
        assert_eq!(Value::Null.display_text(), None);
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Null])
                .display_text()
                .as_deref(),
            Some("[1, null]")
        );
    }
}
