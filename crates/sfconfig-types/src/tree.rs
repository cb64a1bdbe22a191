//! The configuration tree: an arena of typed nodes.
//!
//! Nodes refer to each other through [`NodeId`] handles, so shared and
//! cyclic object graphs are representable without reference counting.
//! Traversals track visited handles instead of object identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::registry::{simple_name, TypeDef, TypeRegistry};
use crate::value::{AttrType, Value};

/// Handle of a node inside a [`ConfigTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An object instance: its registered type and one value per declared slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub ty: String,
    pub slots: Vec<Value>,
}

impl Node {
    pub fn new(ty: impl Into<String>, slots: Vec<Value>) -> Self {
        Self {
            ty: ty.into(),
            slots,
        }
    }
}

/// A nested configuration object graph with its own type registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigTree {
    registry: TypeRegistry,
    nodes: Vec<Node>,
    root: NodeId,
}

impl ConfigTree {
    /// Create a tree whose root is a fresh instance of `root_type`.
    pub fn new(registry: TypeRegistry, root_type: &str) -> TreeResult<Self> {
        let mut tree = Self {
            registry,
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.instantiate(root_type)?;
        Ok(tree)
    }

    /// Assemble a tree from persisted parts, checking its integrity.
    pub fn from_parts(registry: TypeRegistry, nodes: Vec<Node>, root: NodeId) -> TreeResult<Self> {
        let tree = Self {
            registry,
            nodes,
            root,
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Type definition of a node, if both the node and its type exist.
    pub fn type_of(&self, id: NodeId) -> Option<&TypeDef> {
        self.node(id)
            .and_then(|node| self.registry.type_def(&node.ty))
    }

    // ---------------------------------------------------------------
    // Slot access
    // ---------------------------------------------------------------

    /// Whether the node's type declares the attribute.
    pub fn has_attr(&self, id: NodeId, attr: &str) -> bool {
        self.type_of(id).is_some_and(|def| def.position(attr).is_some())
    }

    /// Declared type of an attribute.
    pub fn attr_type(&self, id: NodeId, attr: &str) -> Option<&AttrType> {
        self.type_of(id).and_then(|def| def.attr(attr)).map(|a| &a.ty)
    }

    /// Current value of an attribute; `None` when the attribute is not
    /// declared (or the node is unreadable).
    pub fn attr(&self, id: NodeId, attr: &str) -> Option<&Value> {
        let pos = self.type_of(id)?.position(attr)?;
        self.node(id)?.slots.get(pos)
    }

    /// Nested object held by an attribute, if any.
    pub fn child(&self, id: NodeId, attr: &str) -> Option<NodeId> {
        self.attr(id, attr).and_then(Value::as_object)
    }

    /// Mutable access to an attribute slot.
    pub fn attr_mut(&mut self, id: NodeId, attr: &str) -> TreeResult<&mut Value> {
        let pos = self.slot_position(id, attr)?;
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(TreeError::DanglingNode(id))?;
        if pos >= node.slots.len() {
            return Err(TreeError::SlotCount {
                node: id,
                type_name: node.ty.clone(),
                expected: pos + 1,
                actual: node.slots.len(),
            });
        }
        Ok(&mut node.slots[pos])
    }

    /// Replace an attribute's value, returning the previous one.
    pub fn set_attr(&mut self, id: NodeId, attr: &str, value: Value) -> TreeResult<Value> {
        let slot = self.attr_mut(id, attr)?;
        Ok(std::mem::replace(slot, value))
    }

    fn slot_position(&self, id: NodeId, attr: &str) -> TreeResult<usize> {
        let node = self.node(id).ok_or(TreeError::DanglingNode(id))?;
        let def = self
            .registry
            .type_def(&node.ty)
            .ok_or_else(|| TreeError::UnknownType(node.ty.clone()))?;
        def.position(attr)
            .ok_or_else(|| TreeError::UnknownAttribute {
                type_name: node.ty.clone(),
                attr: attr.to_string(),
            })
    }

    // ---------------------------------------------------------------
    // Allocation
    // ---------------------------------------------------------------

    /// Append a node to the arena.
    pub fn alloc(&mut self, node: Node) -> TreeResult<NodeId> {
        let len = self.nodes.len();
        let id = u32::try_from(len).map_err(|_| TreeError::ArenaFull(len))?;
        self.nodes.push(node);
        Ok(NodeId(id))
    }

    /// Allocate a new instance of a registered type with default slots.
    pub fn instantiate(&mut self, type_name: &str) -> TreeResult<NodeId> {
        let def = self
            .registry
            .type_def(type_name)
            .ok_or_else(|| TreeError::UnknownType(type_name.to_string()))?;
        let slots = def.attrs.iter().map(|a| a.ty.default_value()).collect();
        self.alloc(Node::new(type_name, slots))
    }

    /// Drop nodes unreachable from the root and renumber the survivors in
    /// their original order. Returns how many nodes were dropped.
    ///
    /// A tree with dangling handles is left untouched.
    pub fn compact(&mut self) -> usize {
        if self.validate().is_err() {
            return 0;
        }
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match reachable.get_mut(id.index()) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            if let Some(node) = self.nodes.get(id.index()) {
                node.slots.iter().for_each(|v| push_handles(v, &mut stack));
            }
        }

        let dropped = reachable.iter().filter(|keep| !**keep).count();
        if dropped == 0 {
            return 0;
        }
        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0u32;
        for (idx, keep) in reachable.iter().enumerate() {
            if *keep {
                remap[idx] = Some(NodeId(next));
                next += 1;
            }
        }

        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(reachable)
            .filter_map(|(node, keep)| keep.then_some(node))
            .collect();
        for node in &mut self.nodes {
            node.slots.iter_mut().for_each(|v| remap_handles(v, &remap));
        }
        if let Some(Some(root)) = remap.get(self.root.index()) {
            self.root = *root;
        }
        dropped
    }

    // ---------------------------------------------------------------
    // Integrity
    // ---------------------------------------------------------------

    /// Check that every node's type is registered, slot counts match their
    /// layouts, and every object handle points into the arena.
    pub fn validate(&self) -> TreeResult<()> {
        if self.node(self.root).is_none() {
            return Err(TreeError::DanglingNode(self.root));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            let id = NodeId(idx as u32);
            let def = self
                .registry
                .type_def(&node.ty)
                .ok_or_else(|| TreeError::UnknownType(node.ty.clone()))?;
            if def.attrs.len() != node.slots.len() {
                return Err(TreeError::SlotCount {
                    node: id,
                    type_name: node.ty.clone(),
                    expected: def.attrs.len(),
                    actual: node.slots.len(),
                });
            }
            for value in &node.slots {
                self.check_handles(value)?;
            }
        }
        Ok(())
    }

    fn check_handles(&self, value: &Value) -> TreeResult<()> {
        match value {
            Value::Object(id) if self.node(*id).is_none() => Err(TreeError::DanglingNode(*id)),
            Value::List(items) => items.iter().try_for_each(|v| self.check_handles(v)),
            Value::Map(entries) => entries.iter().try_for_each(|(_, v)| self.check_handles(v)),
            _ => Ok(()),
        }
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    /// Text rendering of a value; objects render as `SimpleName#handle`.
    pub fn stringify(&self, value: &Value) -> Option<String> {
        match value {
            Value::Object(id) => Some(match self.node(*id) {
                Some(node) => format!("{}#{id}", simple_name(&node.ty)),
                None => format!("#{id}"),
            }),
            other => other.display_text(),
        }
    }

    /// JSON presentation of a value.
    ///
    /// Enums become their member name, lists become arrays of item text
    /// (null items stay null), maps become objects, nested objects become
    /// their text rendering.
    pub fn to_json(&self, value: &Value) -> serde_json::Value {
        use serde_json::Value as Json;
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Char(c) => Json::String(c.to_string()),
            Value::Byte(v) => Json::from(*v),
            Value::Short(v) => Json::from(*v),
            Value::Int(v) => Json::from(*v),
            Value::Long(v) => Json::from(*v),
            Value::Float(v) => float_json(f64::from(*v)),
            Value::Double(v) | Value::Number(v) => float_json(*v),
            Value::Str(s) => Json::String(s.clone()),
            Value::Enum { member, .. } => Json::String(member.clone()),
            Value::List(items) => Json::Array(self.string_items(items)),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.to_json(v)))
                    .collect(),
            ),
            Value::Object(_) => self
                .stringify(value)
                .map(Json::String)
                .unwrap_or(Json::Null),
        }
    }

    /// List items as JSON strings, keeping nulls.
    pub fn string_items(&self, items: &[Value]) -> Vec<serde_json::Value> {
        items
            .iter()
            .map(|item| {
                self.stringify(item)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect()
    }
}

fn push_handles(value: &Value, out: &mut Vec<NodeId>) {
    match value {
        Value::Object(id) => out.push(*id),
        Value::List(items) => items.iter().for_each(|v| push_handles(v, out)),
        Value::Map(entries) => entries.iter().for_each(|(_, v)| push_handles(v, out)),
        _ => {}
    }
}

fn remap_handles(value: &mut Value, remap: &[Option<NodeId>]) {
    match value {
        Value::Object(id) => {
            if let Some(Some(new)) = remap.get(id.index()) {
                *id = *new;
            }
        }
        Value::List(items) => items.iter_mut().for_each(|v| remap_handles(v, remap)),
        Value::Map(entries) => entries.iter_mut().for_each(|(_, v)| remap_handles(v, remap)),
        _ => {}
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AttrDef, EnumDef};
    use crate::value::Primitive;
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_type(TypeDef::new(
            "app.Root",
            vec![
                AttrDef::new("mCount", AttrType::Prim(Primitive::Int)),
                AttrDef::new("mName", AttrType::Str),
                AttrDef::new("mChild", AttrType::Object("app.Child".into())),
                AttrDef::new("mMode", AttrType::Enum("app.Mode".into())),
            ],
        ))
        .register_type(TypeDef::new(
            "app.Child",
            vec![AttrDef::new("mFlag", AttrType::Boxed(Primitive::Bool))],
        ))
        .register_enum(EnumDef::new("app.Mode", ["A", "B"]));
        reg
    }

    #[test]
    fn new_tree_instantiates_defaults() {
        let tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        assert_eq!(tree.attr(root, "mCount"), Some(&Value::Int(0)));
        assert_eq!(tree.attr(root, "mName"), Some(&Value::Null));
        assert_eq!(tree.attr(root, "mMissing"), None);
        assert!(tree.has_attr(root, "mChild"));
        assert!(!tree.has_attr(root, "mMissing"));
    }

    #[test]
    fn set_attr_returns_previous_value() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        let old = tree.set_attr(root, "mCount", Value::Int(5)).unwrap();
        assert_eq!(old, Value::Int(0));
        assert_eq!(tree.attr(root, "mCount"), Some(&Value::Int(5)));
    }

    #[test]
    fn set_undeclared_attribute_fails() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        let err = tree.set_attr(root, "mNope", Value::Null).unwrap_err();
        assert!(matches!(err, TreeError::UnknownAttribute { .. }));
    }

    #[test]
    fn instantiate_unknown_type_fails() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        assert_eq!(
            tree.instantiate("app.Nope"),
            Err(TreeError::UnknownType("app.Nope".into()))
        );
    }

    #[test]
    fn child_links_resolve() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        let child = tree.instantiate("app.Child").unwrap();
        tree.set_attr(root, "mChild", Value::Object(child)).unwrap();
        assert_eq!(tree.child(root, "mChild"), Some(child));
        assert_eq!(tree.attr(child, "mFlag"), Some(&Value::Null));
        tree.validate().unwrap();
    }

    #[test]
    fn validate_rejects_dangling_handles() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        tree.set_attr(root, "mChild", Value::Object(NodeId(42))).unwrap();
        assert_eq!(tree.validate(), Err(TreeError::DanglingNode(NodeId(42))));
    }

    #[test]
    fn validate_rejects_slot_count_mismatch() {
        let reg = registry();
        let nodes = vec![Node::new("app.Root", vec![Value::Int(1)])];
        let err = ConfigTree::from_parts(reg, nodes, NodeId(0)).unwrap_err();
        assert!(matches!(err, TreeError::SlotCount { expected: 4, actual: 1, .. }));
    }

    #[test]
    fn compact_drops_orphans_and_renumbers() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        let orphan = tree.instantiate("app.Child").unwrap();
        let child = tree.instantiate("app.Child").unwrap();
        tree.set_attr(child, "mFlag", Value::Bool(true)).unwrap();
        tree.set_attr(root, "mChild", Value::Object(child)).unwrap();
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.compact(), 1);
        assert_eq!(tree.len(), 2);
        let moved = tree.child(tree.root(), "mChild").unwrap();
        assert_eq!(moved, orphan);
        assert_eq!(tree.attr(moved, "mFlag"), Some(&Value::Bool(true)));
        tree.validate().unwrap();

        assert_eq!(tree.compact(), 0);
    }

    #[test]
    fn compact_leaves_dangling_trees_alone() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let root = tree.root();
        tree.instantiate("app.Child").unwrap();
        tree.set_attr(root, "mChild", Value::Object(NodeId(42))).unwrap();
        assert_eq!(tree.compact(), 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn json_rendering() {
        let mut tree = ConfigTree::new(registry(), "app.Root").unwrap();
        let child = tree.instantiate("app.Child").unwrap();
        assert_eq!(tree.to_json(&Value::enum_member("app.Mode", "B")), json!("B"));
        assert_eq!(
            tree.to_json(&Value::List(vec![Value::str("a"), Value::Null, Value::Int(3)])),
            json!(["a", null, "3"])
        );
        assert_eq!(
            tree.to_json(&Value::Map(vec![("k".into(), Value::Long(9))])),
            json!({"k": 9})
        );
        assert_eq!(tree.to_json(&Value::Object(child)), json!(format!("Child#{child}")));
        assert_eq!(tree.to_json(&Value::Double(f64::NAN)), json!(null));
    }
}
