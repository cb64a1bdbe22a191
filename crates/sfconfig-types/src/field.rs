//! Logical field descriptions derived from a tree walk, and change records.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value::{AttrType, Primitive, Value};

/// Type tag reported for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    Str,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "char")]
    Char,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "map")]
    Map,
    #[serde(rename = "list<string>")]
    StringList,
    #[serde(rename = "extraction_rules")]
    ExtractionRules,
    #[serde(rename = "custom_searches")]
    CustomSearches,
    #[serde(rename = "custom_javascript")]
    CustomJavaScript,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Number => "number",
            Self::Enum => "enum",
            Self::Map => "map",
            Self::StringList => "list<string>",
            Self::ExtractionRules => "extraction_rules",
            Self::CustomSearches => "custom_searches",
            Self::CustomJavaScript => "custom_javascript",
        }
    }

    /// Tag for a stored value. Byte and short widths report as `int`.
    pub fn of_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null | Value::Object(_) => return None,
            Value::Bool(_) => Self::Boolean,
            Value::Char(_) => Self::Char,
            Value::Byte(_) | Value::Short(_) | Value::Int(_) => Self::Int,
            Value::Long(_) => Self::Long,
            Value::Float(_) => Self::Float,
            Value::Double(_) => Self::Double,
            Value::Number(_) => Self::Number,
            Value::Str(_) => Self::Str,
            Value::Enum { .. } => Self::Enum,
            Value::List(_) => Self::StringList,
            Value::Map(_) => Self::Map,
        })
    }

    /// Tag for a declared slot type; used for null leaves.
    pub fn of_declared(ty: &AttrType) -> Option<Self> {
        Some(match ty {
            AttrType::Prim(p) | AttrType::Boxed(p) => match p {
                Primitive::Bool => Self::Boolean,
                Primitive::Char => Self::Char,
                Primitive::Byte | Primitive::Short | Primitive::Int => Self::Int,
                Primitive::Long => Self::Long,
                Primitive::Float => Self::Float,
                Primitive::Double => Self::Double,
            },
            AttrType::Str => Self::Str,
            AttrType::Number => Self::Number,
            AttrType::Enum(_) => Self::Enum,
            AttrType::List => Self::StringList,
            AttrType::Map => Self::Map,
            AttrType::Object(_) => return None,
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one logical field, derived per walk and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Type tag.
    pub ty: FieldType,
    /// JSON presentation of the current value.
    pub value: Json,
    /// Enum member names, when the field is an enum.
    pub enum_options: Option<Vec<String>>,
    /// Item count, for list-shaped fields.
    pub length: Option<usize>,
    /// List-shaped fields are diffed as sets of item text.
    pub is_list: bool,
    /// Whether the field may be patched.
    pub editable: bool,
}

impl FieldInfo {
    /// A scalar field.
    pub fn scalar(ty: FieldType, value: Json) -> Self {
        Self {
            ty,
            value,
            enum_options: None,
            length: None,
            is_list: false,
            editable: false,
        }
    }

    /// An enum field with its member names.
    pub fn enumeration(value: Json, options: Vec<String>) -> Self {
        Self {
            enum_options: Some(options),
            ..Self::scalar(FieldType::Enum, value)
        }
    }

    /// A list-shaped field; the length is taken from the items.
    pub fn list(ty: FieldType, items: Vec<Json>) -> Self {
        Self {
            ty,
            length: Some(items.len()),
            value: Json::Array(items),
            enum_options: None,
            is_list: true,
            editable: false,
        }
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Item texts of a list field, for set comparison. Non-string items
    /// (records, nulls) use their compact JSON text.
    pub fn item_texts(&self) -> Vec<String> {
        match &self.value {
            Json::Array(items) => items.iter().map(json_text).collect(),
            Json::Null => Vec::new(),
            other => vec![json_text(other)],
        }
    }
}

fn json_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Logical fields in discovery order, keyed by dotted path.
pub type FieldMap = IndexMap<String, FieldInfo>;

/// A before/after pair for a field or collection whose value changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub before: Json,
    pub after: Json,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, before: Json, after: Json) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// A record only when the two sides differ.
    pub fn if_changed(path: impl Into<String>, before: Json, after: Json) -> Option<Self> {
        (before != after).then(|| Self::new(path, before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_serialize_to_wire_names() {
        assert_eq!(serde_json::to_value(FieldType::StringList).unwrap(), json!("list<string>"));
        assert_eq!(FieldType::CustomJavaScript.to_string(), "custom_javascript");
    }

    #[test]
    fn narrow_integers_report_as_int() {
        assert_eq!(FieldType::of_value(&Value::Byte(1)), Some(FieldType::Int));
        assert_eq!(
            FieldType::of_declared(&AttrType::Boxed(Primitive::Short)),
            Some(FieldType::Int)
        );
        assert_eq!(FieldType::of_value(&Value::Null), None);
        assert_eq!(FieldType::of_declared(&AttrType::Object("x.Y".into())), None);
    }

    #[test]
    fn list_info_records_length() {
        let info = FieldInfo::list(FieldType::StringList, vec![json!("a"), json!("b")]);
        assert_eq!(info.length, Some(2));
        assert!(info.is_list);
        assert_eq!(info.item_texts(), vec!["a", "b"]);
    }

    #[test]
    fn item_texts_render_records_as_json() {
        let info = FieldInfo::list(FieldType::CustomSearches, vec![json!({"name": "x"}), json!(null)]);
        assert_eq!(info.item_texts(), vec![r#"{"name":"x"}"#.to_string(), "null".to_string()]);
    }

    #[test]
    fn change_record_only_when_different() {
        assert!(ChangeRecord::if_changed("p", json!(1), json!(1)).is_none());
        let rec = ChangeRecord::if_changed("p", json!(1), json!(2)).unwrap();
        assert_eq!(rec.before, json!(1));
        assert_eq!(rec.after, json!(2));
    }
}
