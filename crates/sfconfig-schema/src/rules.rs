//! Rule collections: extraction rules, custom searches and custom scripts.
//!
//! Each collection is a list of physical record objects under a container
//! attribute. Records are presented as logical JSON objects, with a small
//! alias table renaming some physical enum members. The physical layout of
//! each kind is looked up in a [`RuleCatalog`] keyed by config version.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use sfconfig_types::{AttrType, ConfigTree, FieldType, NodeId, Primitive, Value};
use tracing::debug;

use crate::access;
use crate::error::{SchemaError, SchemaResult};
use crate::profile::SchemaProfile;

// ---------------------------------------------------------------------------
// Rule kinds
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "extraction")]
    Extraction,
    #[serde(rename = "custom_search")]
    CustomSearch,
    #[serde(rename = "custom_javascript")]
    CustomJavaScript,
}

impl RuleKind {
    /// Application order of collection edits.
    pub const ALL: [RuleKind; 3] = [
        RuleKind::Extraction,
        RuleKind::CustomSearch,
        RuleKind::CustomJavaScript,
    ];

    /// Short patch key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Extraction => "extractions",
            Self::CustomSearch => "custom_searches",
            Self::CustomJavaScript => "custom_javascript",
        }
    }

    pub fn virtual_path(self) -> &'static str {
        match self {
            Self::Extraction => "mCustomExtractionConfig.extractions",
            Self::CustomSearch => "mCustomSearchConfig.searches",
            Self::CustomJavaScript => "mCustomJavaScriptConfig.javascript",
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Self::Extraction => FieldType::ExtractionRules,
            Self::CustomSearch => FieldType::CustomSearches,
            Self::CustomJavaScript => FieldType::CustomJavaScript,
        }
    }

    /// Sentence-initial name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Extraction => "Extraction",
            Self::CustomSearch => "Custom search",
            Self::CustomJavaScript => "Custom JavaScript",
        }
    }

    /// Mid-sentence name used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::CustomSearch => "custom search",
            Self::CustomJavaScript => "custom JavaScript",
        }
    }

    fn container_label(self) -> &'static str {
        match self {
            Self::Extraction => "Custom extraction",
            Self::CustomSearch => "Custom search",
            Self::CustomJavaScript => "Custom JavaScript",
        }
    }
}

// ---------------------------------------------------------------------------
// Logical records
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRule {
    pub name: Option<String>,
    pub selector: Option<String>,
    pub selector_type: Option<String>,
    pub extract_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSearch {
    pub name: Option<String>,
    pub mode: Option<String>,
    pub data_type: Option<String>,
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJavaScript {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub script_type: Option<String>,
    pub javascript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_types: Option<String>,
}

/// One rule in its logical shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleRecord {
    Extraction(ExtractionRule),
    CustomSearch(CustomSearch),
    CustomJavaScript(CustomJavaScript),
}

impl RuleRecord {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Extraction(_) => RuleKind::Extraction,
            Self::CustomSearch(_) => RuleKind::CustomSearch,
            Self::CustomJavaScript(_) => RuleKind::CustomJavaScript,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Extraction(r) => r.name.as_deref(),
            Self::CustomSearch(r) => r.name.as_deref(),
            Self::CustomJavaScript(r) => r.name.as_deref(),
        }
    }

    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

// ---------------------------------------------------------------------------
// Enum member aliases
// ---------------------------------------------------------------------------

/// (kind, physical attribute, physical member, logical member)
const ENUM_ALIASES: &[(RuleKind, &str, &str, &str)] = &[
    (RuleKind::Extraction, "mExtractionType", "CSSPATH", "CSS"),
    (RuleKind::Extraction, "mDataType", "INNER_TEXT", "TEXT"),
    (RuleKind::Extraction, "mDataType", "OUTER_HTML", "HTML_ELEMENT"),
];

/// Presentation name of a physical enum member.
pub fn logical_member<'a>(kind: RuleKind, attr: &str, physical: &'a str) -> &'a str {
    ENUM_ALIASES
        .iter()
        .find(|(k, a, p, _)| *k == kind && *a == attr && *p == physical)
        .map(|(_, _, _, logical)| *logical)
        .unwrap_or(physical)
}

/// Physical member for a logical input; the input is upper-cased first.
pub fn physical_member(kind: RuleKind, attr: &str, input: &str) -> String {
    let upper = input.to_uppercase();
    ENUM_ALIASES
        .iter()
        .find(|(k, a, _, l)| *k == kind && *a == attr && *l == upper)
        .map(|(_, _, physical, _)| physical.to_string())
        .unwrap_or(upper)
}

// ---------------------------------------------------------------------------
// Versioned catalog
// ---------------------------------------------------------------------------

/// Physical layout of one rule kind from a given config version on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleShape {
    pub kind: RuleKind,
    /// Oldest config version this layout applies to.
    pub since: String,
    /// Root attribute holding the collection's container object.
    pub container: String,
    /// List attribute on the container.
    pub list_attr: String,
    /// Registered type of each record.
    pub record_type: String,
}

impl RuleShape {
    pub fn new(
        kind: RuleKind,
        since: impl Into<String>,
        container: impl Into<String>,
        list_attr: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            since: since.into(),
            container: container.into(),
            list_attr: list_attr.into(),
            record_type: record_type.into(),
        }
    }
}

/// Rule layouts keyed by kind and minimum config version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleCatalog {
    rows: Vec<RuleShape>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new(vec![
            RuleShape::new(
                RuleKind::Extraction,
                "0",
                "mCustomExtractionConfig",
                "mFilters",
                "seo.spider.extraction.CustomExtractionInfo",
            ),
            RuleShape::new(
                RuleKind::CustomSearch,
                "0",
                "mCustomSearchConfig",
                "mSearches",
                "seo.spider.config.custom.search.CustomSearchInfo",
            ),
            RuleShape::new(
                RuleKind::CustomJavaScript,
                "0",
                "mCustomJavaScriptConfig",
                "mJsSnippets",
                "seo.spider.config.custom.javascript.CustomJavaScriptInfo",
            ),
        ])
    }
}

impl RuleCatalog {
    pub fn new(rows: Vec<RuleShape>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: RuleShape) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn rows(&self) -> &[RuleShape] {
        &self.rows
    }

    /// Newest applicable row for the tree's config version, preferring
    /// rows whose record type the tree registers. A tree without a
    /// version matches every row.
    pub fn resolve(&self, tree: &ConfigTree, kind: RuleKind) -> Option<&RuleShape> {
        let version = access::config_version(tree).map(|v| version_key(&v));
        let applicable: Vec<&RuleShape> = self
            .rows
            .iter()
            .filter(|row| row.kind == kind)
            .filter(|row| {
                version
                    .as_ref()
                    .map_or(true, |v| version_key(&row.since) <= *v)
            })
            .collect();

        newest(
            applicable
                .iter()
                .copied()
                .filter(|row| tree.registry().has_type(&row.record_type)),
        )
        .or_else(|| newest(applicable.iter().copied()))
    }
}

fn newest<'a>(rows: impl Iterator<Item = &'a RuleShape>) -> Option<&'a RuleShape> {
    rows.max_by(|a, b| version_key(&a.since).cmp(&version_key(&b.since)))
}

/// Numeric components of a dotted version; non-numeric parts count as 0.
fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn text(tree: &ConfigTree, node: NodeId, attr: &str) -> Option<String> {
    tree.attr(node, attr).and_then(|v| tree.stringify(v))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Logical record of one physical rule object.
pub fn record_of(tree: &ConfigTree, kind: RuleKind, node: NodeId) -> RuleRecord {
    let member = |attr: &str| {
        text(tree, node, attr).map(|m| logical_member(kind, attr, &m).to_string())
    };
    match kind {
        RuleKind::Extraction => RuleRecord::Extraction(ExtractionRule {
            name: text(tree, node, "mName"),
            selector: text(tree, node, "mExpression"),
            selector_type: member("mExtractionType"),
            extract_mode: member("mDataType"),
            attribute: non_empty(text(tree, node, "mAttribute")),
        }),
        RuleKind::CustomSearch => RuleRecord::CustomSearch(CustomSearch {
            name: text(tree, node, "mName"),
            mode: member("mMode"),
            data_type: member("mDataType"),
            query: text(tree, node, "mQuery"),
            case_sensitive: tree
                .attr(node, "mCaseSensitiveTextSearch")
                .and_then(Value::as_bool),
            scope: member("mScope"),
            xpath: non_empty(text(tree, node, "mXPath")),
        }),
        RuleKind::CustomJavaScript => RuleRecord::CustomJavaScript(CustomJavaScript {
            name: text(tree, node, "mName"),
            script_type: member("mType"),
            javascript: text(tree, node, "mJavaScript"),
            timeout_secs: tree.attr(node, "mActionTimeoutSecs").and_then(Value::as_i64),
            content_types: non_empty(text(tree, node, "mContentTypes")),
        }),
    }
}

fn records(tree: &ConfigTree, kind: RuleKind, items: &[Value]) -> Vec<RuleRecord> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|node| record_of(tree, kind, node))
        .collect()
}

/// Logical records of a collection; `None` when the container object is
/// absent. A missing or null list reads as empty.
pub fn read_rules(
    tree: &ConfigTree,
    profile: &SchemaProfile,
    catalog: &RuleCatalog,
    kind: RuleKind,
) -> Option<Vec<RuleRecord>> {
    let shape = catalog.resolve(tree, kind)?;
    let container = access::child(tree, profile, tree.root(), &shape.container)?;
    let items = access::attr(tree, profile, container, &shape.list_attr)
        .and_then(Value::as_list)
        .unwrap_or(&[]);
    Some(records(tree, kind, items))
}

fn rule_name(tree: &ConfigTree, item: &Value) -> Option<String> {
    item.as_object().and_then(|node| text(tree, node, "mName"))
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// Typed view of a JSON op object's fields.
pub fn json_string(fields: &Map<String, Json>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Json::Null => None,
        Json::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_bool(fields: &Map<String, Json>, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Json::Bool(b) => Some(*b),
        Json::String(s) => Some(s.eq_ignore_ascii_case("true")),
        Json::Number(_) => Some(false),
        _ => None,
    }
}

fn json_int(fields: &Map<String, Json>, key: &str) -> Option<i32> {
    match fields.get(key)? {
        Json::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A rule collection opened for editing.
///
/// Edits are applied to a working copy of the list and written back by
/// [`RuleList::commit`].
#[derive(Clone, Debug)]
pub struct RuleList {
    kind: RuleKind,
    shape: RuleShape,
    container: NodeId,
    list_attr: String,
    items: Vec<Value>,
}

impl RuleList {
    pub fn open(
        tree: &ConfigTree,
        profile: &SchemaProfile,
        catalog: &RuleCatalog,
        kind: RuleKind,
    ) -> SchemaResult<Self> {
        let missing =
            || SchemaError::validation(format!("{} config not found", kind.container_label()));
        let shape = catalog.resolve(tree, kind).cloned().ok_or_else(missing)?;
        let container = access::child(tree, profile, tree.root(), &shape.container)
            .ok_or_else(missing)?;
        let list_attr = access::resolve_attr(tree, profile, container, &shape.list_attr)
            .ok_or_else(|| SchemaError::unsupported(kind.key()))?
            .to_string();
        let items = tree
            .attr(container, &list_attr)
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        Ok(Self {
            kind,
            shape,
            container,
            list_attr,
            items,
        })
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical records of the working copy.
    pub fn records(&self, tree: &ConfigTree) -> Vec<RuleRecord> {
        records(tree, self.kind, &self.items)
    }

    /// JSON snapshot of the working copy, as reported in change records.
    pub fn snapshot(&self, tree: &ConfigTree) -> Json {
        Json::Array(self.records(tree).iter().map(RuleRecord::to_json).collect())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove every rule with this name; false when none matched.
    ///
    /// All matches go, not just the first, so a loaded list that already
    /// holds duplicates ends up with unique names after an upsert.
    pub fn remove(&mut self, tree: &ConfigTree, name: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| rule_name(tree, item).as_deref() != Some(name));
        self.items.len() != before
    }

    /// Build a rule from an `add` op's fields and upsert it by name: any
    /// same-named rule is removed and the new one appended.
    pub fn add(&mut self, tree: &mut ConfigTree, fields: &Map<String, Json>) -> SchemaResult<()> {
        let (name, node) = match self.kind {
            RuleKind::Extraction => self.build_extraction(tree, fields)?,
            RuleKind::CustomSearch => self.build_search(tree, fields)?,
            RuleKind::CustomJavaScript => self.build_script(tree, fields)?,
        };
        self.remove(tree, &name);
        self.items.push(Value::Object(node));
        debug!(kind = self.kind.key(), rule = %name, "rule upserted");
        Ok(())
    }

    /// Write the working copy back to the container's list attribute.
    pub fn commit(self, tree: &mut ConfigTree) -> SchemaResult<()> {
        tree.set_attr(self.container, &self.list_attr, Value::List(self.items))?;
        Ok(())
    }

    fn build_extraction(
        &self,
        tree: &mut ConfigTree,
        fields: &Map<String, Json>,
    ) -> SchemaResult<(String, NodeId)> {
        let (Some(name), Some(selector), Some(selector_type), Some(extract_mode)) = (
            json_string(fields, "name"),
            json_string(fields, "selector"),
            json_string(fields, "selectorType"),
            json_string(fields, "extractMode"),
        ) else {
            return Err(SchemaError::validation(
                "Extraction add requires name, selector, selectorType, extractMode",
            ));
        };
        self.ensure_registered(tree)?;
        let extraction_type = self
            .member(tree, "mExtractionType", &selector_type)
            .ok_or_else(|| SchemaError::validation(format!("Invalid selectorType: {selector_type}")))?;
        let data_type = self
            .member(tree, "mDataType", &extract_mode)
            .ok_or_else(|| SchemaError::validation(format!("Invalid extractMode: {extract_mode}")))?;
        let attribute = json_string(fields, "attribute").unwrap_or_default();

        let node = self.instantiate(tree)?;
        assign(tree, node, "mName", Value::Str(name.clone()))?;
        assign(tree, node, "mExtractionType", extraction_type)?;
        assign(tree, node, "mDataType", data_type)?;
        assign(tree, node, "mExpression", Value::Str(selector))?;
        assign(tree, node, "mAttribute", Value::Str(attribute))?;
        Ok((name, node))
    }

    fn build_search(
        &self,
        tree: &mut ConfigTree,
        fields: &Map<String, Json>,
    ) -> SchemaResult<(String, NodeId)> {
        let (Some(name), Some(query)) = (json_string(fields, "name"), json_string(fields, "query"))
        else {
            return Err(SchemaError::validation("Custom search add requires name and query"));
        };
        self.ensure_registered(tree)?;
        let mode = json_string(fields, "mode").unwrap_or_else(|| "CONTAINS".into());
        let data_type = json_string(fields, "dataType").unwrap_or_else(|| "TEXT".into());
        let scope = json_string(fields, "scope").unwrap_or_else(|| "HTML".into());
        let mode_value = self
            .member(tree, "mMode", &mode)
            .ok_or_else(|| SchemaError::validation(format!("Invalid search mode: {mode}")))?;
        let data_value = self
            .member(tree, "mDataType", &data_type)
            .ok_or_else(|| SchemaError::validation(format!("Invalid search data type: {data_type}")))?;
        let scope_value = self
            .member(tree, "mScope", &scope)
            .ok_or_else(|| SchemaError::validation(format!("Invalid search scope: {scope}")))?;
        let case_sensitive = json_bool(fields, "caseSensitive").unwrap_or(false);

        let node = self.instantiate(tree)?;
        assign(tree, node, "mName", Value::Str(name.clone()))?;
        assign(tree, node, "mMode", mode_value)?;
        assign(tree, node, "mDataType", data_value)?;
        assign(tree, node, "mQuery", Value::Str(query))?;
        assign(tree, node, "mCaseSensitiveTextSearch", Value::Bool(case_sensitive))?;
        assign(tree, node, "mScope", scope_value)?;
        if let Some(xpath) = json_string(fields, "xpath") {
            assign(tree, node, "mXPath", Value::Str(xpath))?;
        }
        Ok((name, node))
    }

    fn build_script(
        &self,
        tree: &mut ConfigTree,
        fields: &Map<String, Json>,
    ) -> SchemaResult<(String, NodeId)> {
        let (Some(name), Some(javascript)) =
            (json_string(fields, "name"), json_string(fields, "javascript"))
        else {
            return Err(SchemaError::validation(
                "Custom JavaScript add requires name and javascript",
            ));
        };
        self.ensure_registered(tree)?;
        let script_type = json_string(fields, "type").unwrap_or_else(|| "EXTRACTION".into());
        let type_value = self.member(tree, "mType", &script_type).ok_or_else(|| {
            SchemaError::validation(format!("Invalid custom JavaScript type: {script_type}"))
        })?;
        let timeout = json_int(fields, "timeout_secs").unwrap_or(10);
        let content_types =
            json_string(fields, "content_types").unwrap_or_else(|| "text/html".into());

        let node = self.instantiate(tree)?;
        assign(tree, node, "mName", Value::Str(name.clone()))?;
        assign(tree, node, "mType", type_value)?;
        assign(tree, node, "mJavaScript", Value::Str(javascript))?;
        let timeout_value = int_value(tree.attr_type(node, "mActionTimeoutSecs"), timeout);
        assign(tree, node, "mActionTimeoutSecs", timeout_value)?;
        assign(tree, node, "mContentTypes", Value::Str(content_types))?;
        Ok((name, node))
    }

    fn ensure_registered(&self, tree: &ConfigTree) -> SchemaResult<()> {
        if tree.registry().has_type(&self.shape.record_type) {
            Ok(())
        } else {
            Err(self.unable_to_create())
        }
    }

    fn unable_to_create(&self) -> SchemaError {
        SchemaError::validation(format!("Unable to create {} rule", self.kind.noun()))
    }

    fn instantiate(&self, tree: &mut ConfigTree) -> SchemaResult<NodeId> {
        tree.instantiate(&self.shape.record_type)
            .map_err(|_| self.unable_to_create())
    }

    /// Resolve a logical enum input against the record attribute's enum.
    fn member(&self, tree: &ConfigTree, attr: &str, input: &str) -> Option<Value> {
        let record = tree.registry().type_def(&self.shape.record_type)?;
        let AttrType::Enum(enum_name) = &record.attr(attr)?.ty else {
            return None;
        };
        let def = tree.registry().enum_def(enum_name)?;
        let physical = physical_member(self.kind, attr, input);
        let canonical = def.find_member(&physical)?;
        Some(Value::enum_member(def.name.clone(), canonical))
    }
}

/// Set an attribute when the record type declares it.
fn assign(tree: &mut ConfigTree, node: NodeId, attr: &str, value: Value) -> SchemaResult<()> {
    if tree.has_attr(node, attr) {
        tree.set_attr(node, attr, value)?;
    }
    Ok(())
}

fn int_value(declared: Option<&AttrType>, value: i32) -> Value {
    match declared {
        Some(AttrType::Prim(Primitive::Long) | AttrType::Boxed(Primitive::Long)) => {
            Value::Long(i64::from(value))
        }
        _ => Value::Int(value),
    }
}
