//! The patch engine: allowlisted, ordered, all-or-nothing edits with a
//! change log.
//!
//! Application order is fixed. Rule collections go first (extractions,
//! then custom searches, then custom JavaScript), then every other key in
//! the order the caller wrote it. Edits run against a clone of the tree
//! which replaces the caller's tree only when every edit succeeded.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use sfconfig_schema::{access, SchemaProfile, VirtualField, VirtualLayer};
use sfconfig_types::{AttrType, ChangeRecord, ConfigTree, NodeId, Primitive, Value};
use tracing::debug;

use crate::coerce::coerce;
use crate::collections::apply_rule_ops;
use crate::error::{PatchError, PatchResult};
use crate::list::ListPatch;

// ---------------------------------------------------------------------------
// PatchSet
// ---------------------------------------------------------------------------

/// A patch document: a JSON object of logical path to edit, in caller
/// order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchSet {
    entries: Map<String, Json>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed document, which must be an object.
    pub fn from_value(value: Json) -> PatchResult<Self> {
        match value {
            Json::Object(entries) => Ok(Self { entries }),
            _ => Err(PatchError::Parse("Patches must be a JSON object".into())),
        }
    }

    /// Append an edit; a repeated path replaces the earlier edit in place.
    pub fn insert(&mut self, path: impl Into<String>, edit: Json) -> &mut Self {
        self.entries.insert(path.into(), edit);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromStr for PatchSet {
    type Err = PatchError;

    fn from_str(text: &str) -> PatchResult<Self> {
        let value: Json = serde_json::from_str(text)
            .map_err(|err| PatchError::Parse(format!("Invalid JSON for patches: {err}")))?;
        Self::from_value(value)
    }
}

/// What a successful patch changed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub changes: Vec<ChangeRecord>,
    /// Non-fatal findings, such as removing a rule that does not exist.
    pub warnings: Vec<String>,
}

impl PatchOutcome {
    /// A path edited twice in one patch keeps a single record spanning
    /// both edits.
    fn record(&mut self, path: &str, before: Json, after: Json) {
        if let Some(pos) = self.changes.iter().position(|c| c.path == path) {
            let first = self.changes.remove(pos);
            if let Some(change) = ChangeRecord::if_changed(path, first.before, after) {
                self.changes.insert(pos, change);
            }
            return;
        }
        if let Some(change) = ChangeRecord::if_changed(path, before, after) {
            debug!(path, "field changed");
            self.changes.push(change);
        }
    }
}

// ---------------------------------------------------------------------------
// PatchEngine
// ---------------------------------------------------------------------------

/// Applies patch documents through a virtual layer.
#[derive(Clone, Debug)]
pub struct PatchEngine<'p> {
    layer: VirtualLayer<'p>,
}

impl<'p> PatchEngine<'p> {
    pub fn new(profile: &'p SchemaProfile) -> Self {
        Self::with_layer(VirtualLayer::new(profile))
    }

    pub fn with_layer(layer: VirtualLayer<'p>) -> Self {
        Self { layer }
    }

    pub fn layer(&self) -> &VirtualLayer<'p> {
        &self.layer
    }

    fn profile(&self) -> &'p SchemaProfile {
        self.layer.profile()
    }

    /// Apply `patches` to `tree`. On error the tree is left as it was.
    pub fn apply(&self, tree: &mut ConfigTree, patches: &PatchSet) -> PatchResult<PatchOutcome> {
        self.check_allowlist(patches)?;

        let mut staged = tree.clone();
        let mut outcome = PatchOutcome::default();
        self.apply_collections(&mut staged, patches, &mut outcome)?;
        for (path, edit) in patches.iter() {
            if self.profile().collection_for_key(path).is_none() {
                self.apply_field(&mut staged, path, edit, &mut outcome)?;
            }
        }

        let dropped = staged.compact();
        *tree = staged;
        debug!(
            changes = outcome.changes.len(),
            dropped,
            warnings = outcome.warnings.len(),
            "patch applied"
        );
        Ok(outcome)
    }

    fn check_allowlist(&self, patches: &PatchSet) -> PatchResult<()> {
        let profile = self.profile();
        match patches.iter().find(|(path, _)| !profile.is_editable(path)) {
            Some((path, _)) => Err(PatchError::NotAllowed {
                path: path.to_string(),
                allowed_fields: profile.allowed_fields(),
            }),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Rule collections
    // -----------------------------------------------------------------------

    fn apply_collections(
        &self,
        tree: &mut ConfigTree,
        patches: &PatchSet,
        outcome: &mut PatchOutcome,
    ) -> PatchResult<()> {
        let profile = self.profile();
        for binding in sorted_bindings(profile) {
            for (key, edit) in patches.iter().filter(|(key, _)| binding.matches(key)) {
                let ops = edit
                    .as_array()
                    .ok_or_else(|| PatchError::validation(format!("{key} must be an array")))?;
                let mut list = self.layer.open_rules(tree, binding.kind)?;
                let before = list.snapshot(tree);
                apply_rule_ops(&mut list, tree, ops, &mut outcome.warnings)?;
                let after = list.snapshot(tree);
                list.commit(tree)?;
                outcome.record(&binding.virtual_path, before, after);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    fn apply_field(
        &self,
        tree: &mut ConfigTree,
        path: &str,
        edit: &Json,
        outcome: &mut PatchOutcome,
    ) -> PatchResult<()> {
        if let Some(field) = VirtualField::from_path(path) {
            if self.layer.routes(tree, field) {
                return self.apply_virtual(tree, field, edit, outcome);
            }
        }
        self.apply_physical(tree, path, edit, outcome)
    }

    fn apply_virtual(
        &self,
        tree: &mut ConfigTree,
        field: VirtualField,
        edit: &Json,
        outcome: &mut PatchOutcome,
    ) -> PatchResult<()> {
        let path = field.path();
        let mirrors = field.with_mirrors();
        let before: Vec<Json> = mirrors.iter().map(|f| self.virtual_value(tree, *f)).collect();
        match field {
            VirtualField::Limit(limit) => {
                let int = AttrType::Prim(Primitive::Int);
                let value = match coerce(tree.registry(), &int, edit, path)? {
                    Value::Int(v) => v,
                    _ => return Err(PatchError::validation(format!("Invalid int for: {path}"))),
                };
                self.layer.set_limit(tree, limit, value)?;
            }
            VirtualField::RenderingMode => {
                let mode = match coerce(tree.registry(), &AttrType::Str, edit, path)? {
                    Value::Str(mode) => mode,
                    _ => return Err(PatchError::validation(format!("Invalid string for: {path}"))),
                };
                self.layer.set_rendering_mode(tree, &mode)?;
            }
            VirtualField::ExcludePatterns | VirtualField::ExcludeUrls => {
                let patch = ListPatch::parse(edit)?;
                let current = self.layer.exclude_list(tree).unwrap_or_default();
                self.layer.set_exclude_list(tree, &patch.apply(current))?;
            }
        }
        for (mirror, before) in mirrors.into_iter().zip(before) {
            let after = self.virtual_value(tree, mirror);
            outcome.record(mirror.path(), before, after);
        }
        Ok(())
    }

    fn virtual_value(&self, tree: &ConfigTree, field: VirtualField) -> Json {
        self.layer
            .read(tree, field)
            .map(|info| info.value)
            .unwrap_or(Json::Null)
    }

    fn apply_physical(
        &self,
        tree: &mut ConfigTree,
        path: &str,
        edit: &Json,
        outcome: &mut PatchOutcome,
    ) -> PatchResult<()> {
        let (owner, attr) = resolve_path(tree, self.profile(), path)?;
        let declared = tree
            .attr_type(owner, &attr)
            .cloned()
            .ok_or_else(|| PatchError::validation(format!("Field not found: {attr}")))?;

        if self.profile().is_list_field(path) {
            return apply_physical_list(tree, owner, &attr, &declared, path, edit, outcome);
        }

        let value = coerce(tree.registry(), &declared, edit, path)?;
        let after = tree.to_json(&value);
        let previous = tree.set_attr(owner, &attr, value)?;
        outcome.record(path, tree.to_json(&previous), after);
        Ok(())
    }
}

/// Collection bindings in application order.
fn sorted_bindings(profile: &SchemaProfile) -> Vec<&sfconfig_schema::CollectionBinding> {
    let mut bindings: Vec<_> = profile.collections.iter().collect();
    bindings.sort_by_key(|binding| binding.kind);
    bindings
}

fn apply_physical_list(
    tree: &mut ConfigTree,
    owner: NodeId,
    attr: &str,
    declared: &AttrType,
    path: &str,
    edit: &Json,
    outcome: &mut PatchOutcome,
) -> PatchResult<()> {
    if *declared != AttrType::List {
        return Err(PatchError::validation(format!(
            "Unsupported field type: {path} is not a list"
        )));
    }
    let patch = ListPatch::parse(edit)?;
    let current = tree.attr(owner, attr).cloned().unwrap_or(Value::Null);
    let before = tree.to_json(&current);
    let items: Vec<Option<String>> = current
        .as_list()
        .map(|items| items.iter().map(|item| tree.stringify(item)).collect())
        .unwrap_or_default();

    let updated = Value::List(
        patch
            .apply(items)
            .into_iter()
            .map(|item| item.map(Value::Str).unwrap_or(Value::Null))
            .collect(),
    );
    let after = tree.to_json(&updated);
    tree.set_attr(owner, attr, updated)?;
    outcome.record(path, before, after);
    Ok(())
}

/// Walk a dotted path to the object owning its last segment. Returns the
/// owner and the attribute spelling the owner declares.
fn resolve_path(tree: &ConfigTree, profile: &SchemaProfile, path: &str) -> PatchResult<(NodeId, String)> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(PatchError::validation(format!("Field not found: {path}")));
    };

    let mut current = tree.root();
    for segment in parents {
        let actual = access::resolve_attr(tree, profile, current, segment)
            .ok_or_else(|| PatchError::validation(format!("Field not found: {segment}")))?;
        current = match tree.attr(current, actual) {
            Some(Value::Object(id)) => *id,
            Some(Value::Null) | None => {
                return Err(PatchError::validation(format!(
                    "Null field encountered at: {segment}"
                )))
            }
            Some(_) => return Err(PatchError::validation(format!("Field not found: {segment}"))),
        };
    }

    let actual = access::resolve_attr(tree, profile, current, leaf)
        .ok_or_else(|| PatchError::validation(format!("Field not found: {leaf}")))?;
    Ok((current, actual.to_string()))
}
