//! Field-level diff: compare two logical field maps.
//!
//! The compared paths are the union of both maps, A's paths first and then
//! B's novel paths, each in discovery order. A path missing on one side
//! compares as null.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use sfconfig_types::{FieldInfo, FieldMap};

use crate::list_diff::{diff_lists, ListDelta};

/// The result of comparing two field maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldsDiff {
    pub differences: Vec<FieldDiff>,
}

impl FieldsDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Reported as `totalDifferences`.
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Number of scalar differences.
    pub fn scalars(&self) -> usize {
        self.differences
            .iter()
            .filter(|d| matches!(d, FieldDiff::Scalar { .. }))
            .count()
    }

    /// Number of list differences.
    pub fn lists(&self) -> usize {
        self.differences
            .iter()
            .filter(|d| matches!(d, FieldDiff::List { .. }))
            .count()
    }

    pub fn get(&self, path: &str) -> Option<&FieldDiff> {
        self.differences.iter().find(|d| d.path() == path)
    }
}

/// One differing path.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldDiff {
    /// Serialized as `{path, valueA, valueB}`.
    Scalar {
        path: String,
        value_a: Value,
        value_b: Value,
    },
    /// Serialized as `{path, type: "list", added, removed, unchanged}`.
    List { path: String, delta: ListDelta },
}

impl FieldDiff {
    pub fn path(&self) -> &str {
        match self {
            Self::Scalar { path, .. } | Self::List { path, .. } => path,
        }
    }
}

impl Serialize for FieldDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar {
                path,
                value_a,
                value_b,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("path", path)?;
                map.serialize_entry("valueA", value_a)?;
                map.serialize_entry("valueB", value_b)?;
                map.end()
            }
            Self::List { path, delta } => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("path", path)?;
                map.serialize_entry("type", "list")?;
                map.serialize_entry("added", &delta.added)?;
                map.serialize_entry("removed", &delta.removed)?;
                map.serialize_entry("unchanged", &delta.unchanged)?;
                map.end()
            }
        }
    }
}

/// Compare two field maps, optionally restricted to paths starting with
/// `prefix`.
///
/// When both sides hold a list the comparison is by distinct item text and
/// a record is emitted only if an item was added or removed. Everything
/// else compares by JSON value.
pub fn diff_fields(a: &FieldMap, b: &FieldMap, prefix: Option<&str>) -> FieldsDiff {
    let in_scope = |path: &str| prefix.map_or(true, |p| path.starts_with(p));
    let paths = a
        .keys()
        .chain(b.keys().filter(|path| !a.contains_key(*path)))
        .filter(|path| in_scope(path.as_str()));

    let mut differences = Vec::new();
    for path in paths {
        if let Some(diff) = diff_path(path, a.get(path), b.get(path)) {
            differences.push(diff);
        }
    }
    FieldsDiff { differences }
}

fn diff_path(path: &str, a: Option<&FieldInfo>, b: Option<&FieldInfo>) -> Option<FieldDiff> {
    if let (Some(a), Some(b)) = (a, b) {
        if a.is_list && b.is_list {
            let delta = diff_lists(&a.item_texts(), &b.item_texts());
            return (!delta.is_same()).then(|| FieldDiff::List {
                path: path.to_string(),
                delta,
            });
        }
    }

    let value_a = a.map_or(Value::Null, |info| info.value.clone());
    let value_b = b.map_or(Value::Null, |info| info.value.clone());
    (value_a != value_b).then(|| FieldDiff::Scalar {
        path: path.to_string(),
        value_a,
        value_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfconfig_types::FieldType;

    fn scalar(value: Value) -> FieldInfo {
        FieldInfo::scalar(FieldType::Str, value)
    }

    fn list(items: &[&str]) -> FieldInfo {
        FieldInfo::list(FieldType::StringList, items.iter().map(|s| json!(s)).collect())
    }

    fn fields(entries: Vec<(&str, FieldInfo)>) -> FieldMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn identical_maps_no_diff() {
        let a = fields(vec![("x", scalar(json!(1))), ("l", list(&["a"]))]);
        let diff = diff_fields(&a, &a, None);
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn scalar_paths_reported_iff_unequal() {
        let a = fields(vec![("x", scalar(json!(1))), ("y", scalar(json!("s")))]);
        let b = fields(vec![("x", scalar(json!(2))), ("y", scalar(json!("s")))]);
        let diff = diff_fields(&a, &b, None);
        assert_eq!(diff.len(), 1);
        assert_eq!(
            diff.differences[0],
            FieldDiff::Scalar {
                path: "x".into(),
                value_a: json!(1),
                value_b: json!(2)
            }
        );
    }

    #[test]
    fn union_order_is_a_then_novel_b() {
        let a = fields(vec![("p", scalar(json!(1))), ("q", scalar(json!(1)))]);
        let b = fields(vec![("r", scalar(json!(1))), ("q", scalar(json!(2)))]);
        let diff = diff_fields(&a, &b, None);
        let paths: Vec<_> = diff.differences.iter().map(FieldDiff::path).collect();
        assert_eq!(paths, vec!["p", "q", "r"]);
        assert_eq!(diff.get("p").unwrap(), &FieldDiff::Scalar {
            path: "p".into(),
            value_a: json!(1),
            value_b: Value::Null,
        });
    }

    #[test]
    fn lists_compare_as_sets() {
        let a = fields(vec![("l", list(&["a", "b"])), ("m", list(&["x", "y"]))]);
        let b = fields(vec![("l", list(&["b", "a", "a"])), ("m", list(&["y", "z"]))]);
        let diff = diff_fields(&a, &b, None);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.lists(), 1);
        let json = serde_json::to_value(&diff.differences[0]).unwrap();
        assert_eq!(
            json,
            json!({"path": "m", "type": "list", "added": ["z"], "removed": ["x"], "unchanged": ["y"]})
        );
    }

    #[test]
    fn list_against_scalar_is_a_scalar_record() {
        let a = fields(vec![("l", list(&["a"]))]);
        let b = fields(vec![("l", scalar(Value::Null))]);
        let diff = diff_fields(&a, &b, None);
        assert_eq!(diff.scalars(), 1);
        let json = serde_json::to_value(&diff.differences[0]).unwrap();
        assert_eq!(json, json!({"path": "l", "valueA": ["a"], "valueB": null}));
    }

    #[test]
    fn prefix_filters_both_sides() {
        let a = fields(vec![("mA.x", scalar(json!(1))), ("mB.x", scalar(json!(1)))]);
        let b = fields(vec![("mA.x", scalar(json!(2))), ("mB.x", scalar(json!(2))), ("mA.y", scalar(json!(3)))]);
        let diff = diff_fields(&a, &b, Some("mA."));
        let paths: Vec<_> = diff.differences.iter().map(FieldDiff::path).collect();
        assert_eq!(paths, vec!["mA.x", "mA.y"]);
    }
}
