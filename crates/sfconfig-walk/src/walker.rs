//! Depth-first walk of a config tree into dotted-path field descriptions.
//!
//! The walk never fails. Anything it cannot read (dangling handles,
//! unregistered types, short slot vectors) is skipped with a trace event,
//! since the physical layout comes from an untrusted file.

use sfconfig_schema::SchemaProfile;
use sfconfig_types::{ConfigTree, FieldInfo, FieldMap, FieldType, NodeId, Value};
use tracing::trace;

/// Walk everything reachable from `start`, prefixing paths with `prefix`.
pub fn walk(tree: &ConfigTree, profile: &SchemaProfile, start: NodeId, prefix: &str) -> FieldMap {
    let mut walker = Walker::new(tree, profile);
    walker.visit(start, prefix, 0);
    walker.fields
}

/// Walk from the root with an empty prefix.
pub fn walk_tree(tree: &ConfigTree, profile: &SchemaProfile) -> FieldMap {
    walk(tree, profile, tree.root(), "")
}

struct Walker<'a> {
    tree: &'a ConfigTree,
    profile: &'a SchemaProfile,
    /// Indexed by node handle.
    visited: Vec<bool>,
    fields: FieldMap,
}

impl<'a> Walker<'a> {
    fn new(tree: &'a ConfigTree, profile: &'a SchemaProfile) -> Self {
        Self {
            tree,
            profile,
            visited: vec![false; tree.len()],
            fields: FieldMap::new(),
        }
    }

    fn visit(&mut self, id: NodeId, prefix: &str, depth: usize) {
        if depth > self.profile.max_depth {
            trace!(prefix, depth, "depth limit reached");
            return;
        }
        match self.visited.get_mut(id.index()) {
            Some(seen) if *seen => return,
            Some(seen) => *seen = true,
            None => {
                trace!(prefix, node = %id, "dangling node handle");
                return;
            }
        }

        let tree = self.tree;
        let (Some(node), Some(def)) = (tree.node(id), tree.type_of(id)) else {
            trace!(prefix, node = %id, "unregistered node type");
            return;
        };

        for (pos, attr) in def.attrs.iter().enumerate() {
            if self.profile.is_excluded(prefix, &attr.name) {
                continue;
            }
            let path = if prefix.is_empty() {
                attr.name.clone()
            } else {
                format!("{prefix}.{}", attr.name)
            };
            let Some(value) = node.slots.get(pos) else {
                trace!(%path, "missing slot");
                continue;
            };

            match value {
                Value::Null => {
                    if attr.ty.is_leaf() {
                        if let Some(ty) = FieldType::of_declared(&attr.ty) {
                            self.fields.insert(path, FieldInfo::scalar(ty, serde_json::Value::Null));
                        }
                    }
                }
                Value::List(items) => {
                    let info = FieldInfo::list(FieldType::StringList, tree.string_items(items));
                    self.fields.insert(path, info);
                }
                Value::Object(child) => self.descend(*child, path, depth),
                leaf => {
                    let info = self.leaf_info(leaf);
                    self.fields.insert(path, info);
                }
            }
        }
    }

    fn descend(&mut self, child: NodeId, path: String, depth: usize) {
        let Some(node) = self.tree.node(child) else {
            trace!(%path, node = %child, "dangling node handle");
            return;
        };
        if self.profile.is_foreign(&node.ty) {
            return;
        }
        self.visit(child, &path, depth + 1);
    }

    fn leaf_info(&self, value: &Value) -> FieldInfo {
        let json = self.tree.to_json(value);
        match value {
            Value::Enum { ty, .. } => match self.tree.registry().enum_def(ty) {
                Some(def) => FieldInfo::enumeration(json, def.members.clone()),
                None => FieldInfo::scalar(FieldType::Enum, json),
            },
            other => {
                let ty = FieldType::of_value(other).unwrap_or(FieldType::Str);
                FieldInfo::scalar(ty, json)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfconfig_types::fixture::{self, spider_tree, Layout};
    use sfconfig_types::{AttrDef, AttrType, EnumDef, Node, Primitive, TypeDef, TypeRegistry};

    fn paths(fields: &FieldMap) -> Vec<&str> {
        fields.keys().map(String::as_str).collect()
    }

    #[test]
    fn walks_current_layout_depth_first() {
        let profile = SchemaProfile::default();
        let fields = walk_tree(&spider_tree(Layout::Current), &profile);
        assert_eq!(
            paths(&fields),
            vec![
                "mConfigVersion",
                "mCrawlConfig.mMaxThreads",
                "mCrawlConfig.mLimitSearchTotal",
                "mCrawlConfig.mSearchTotalLimit",
                "mCrawlConfig.mLimitSearchDepth",
                "mCrawlConfig.mSearchDepthLimit",
                "mCrawlConfig.mRenderingMode",
                "mCrawlConfig.mRobotsTxtMode",
                "mCrawlConfig.mRespectCanonical",
                "mCrawlConfig.mCrawlDelay",
                "mCrawlConfig.mCrawlCSS",
                "mCrawlConfig.mStoreCSS",
                "mCrawlConfig.mIncludePatterns",
                "mUserAgentConfig.mUserAgent",
                "mUserAgentConfig.mPreset",
                "mCustomSearchConfig.mSearches",
                "mCustomJavaScriptConfig.mJsSnippets",
                "mProxyConfig.mHost",
                "mProxyConfig.mPort",
                "mProxyConfig.mPassword",
                "mExtraHeaders",
            ]
        );
    }

    #[test]
    fn leaf_descriptions() {
        let profile = SchemaProfile::default();
        let fields = walk_tree(&spider_tree(Layout::Current), &profile);

        let threads = &fields["mCrawlConfig.mMaxThreads"];
        assert_eq!(threads.ty, FieldType::Int);
        assert_eq!(threads.value, json!(5));

        let robots = &fields["mCrawlConfig.mRobotsTxtMode"];
        assert_eq!(robots.ty, FieldType::Enum);
        assert_eq!(
            robots.enum_options,
            Some(vec!["RESPECT".into(), "IGNORE".into(), "IGNORE_REPORT".into()])
        );

        let delay = &fields["mCrawlConfig.mCrawlDelay"];
        assert_eq!(delay.ty, FieldType::Double);
        assert!(delay.value.is_null());

        let include = &fields["mCrawlConfig.mIncludePatterns"];
        assert!(include.is_list);
        assert_eq!(include.length, Some(1));
        assert_eq!(include.value, json!(["/blog/.*"]));

        let headers = &fields["mExtraHeaders"];
        assert_eq!(headers.ty, FieldType::Map);
        assert_eq!(headers.value, json!({"X-Env": "staging"}));
    }

    #[test]
    fn exclusions_apply_to_both_manager_spellings() {
        let profile = SchemaProfile::default();
        for layout in [Layout::Current, Layout::Legacy] {
            let fields = walk_tree(&spider_tree(layout), &profile);
            assert!(fields.keys().all(|p| !p.ends_with("mRawExcludeListString")));
            assert!(!fields.contains_key("mCustomExtractionConfig.mFilters"));
        }
    }

    #[test]
    fn prefix_is_prepended() {
        let profile = SchemaProfile::default();
        let tree = spider_tree(Layout::Current);
        let ua = tree.child(tree.root(), "mUserAgentConfig").unwrap();
        let fields = walk(&tree, &profile, ua, "agent");
        assert_eq!(paths(&fields), vec!["agent.mUserAgent", "agent.mPreset"]);
    }

    fn chain_registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_type(TypeDef::new(
            "app.Link",
            vec![
                AttrDef::new("mValue", AttrType::Prim(Primitive::Int)),
                AttrDef::new("mNext", AttrType::Object("app.Link".into())),
            ],
        ))
        .register_enum(EnumDef::new("app.Unused", ["A"]));
        reg
    }

    /// A linked chain of `len` nodes.
    fn chain(len: usize) -> ConfigTree {
        let mut tree = ConfigTree::new(chain_registry(), "app.Link").unwrap();
        let mut prev = tree.root();
        for i in 1..len {
            let next = tree.instantiate("app.Link").unwrap();
            tree.set_attr(next, "mValue", Value::Int(i as i32)).unwrap();
            tree.set_attr(prev, "mNext", Value::Object(next)).unwrap();
            prev = next;
        }
        tree
    }

    #[test]
    fn depth_is_bounded() {
        let profile = SchemaProfile::default();
        let fields = walk_tree(&chain(20), &profile);
        // Root at depth 0 through depth 10: eleven values.
        assert_eq!(fields.len(), 11);
        let deepest = fields.keys().last().unwrap();
        assert_eq!(deepest.matches("mNext").count(), 10);
    }

    #[test]
    fn cycles_are_visited_once() {
        let profile = SchemaProfile::default();
        let mut tree = chain(3);
        let root = tree.root();
        let last = NodeId(2);
        tree.set_attr(last, "mNext", Value::Object(root)).unwrap();
        let fields = walk_tree(&tree, &profile);
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn unreadable_nodes_are_skipped() {
        let profile = SchemaProfile::default();
        let mut tree = chain(2);
        let root = tree.root();
        tree.set_attr(root, "mNext", Value::Object(NodeId(99))).unwrap();
        let fields = walk_tree(&tree, &profile);
        assert_eq!(paths(&fields), vec!["mValue"]);

        // A node whose slot vector is shorter than its layout.
        let short = tree.alloc(Node::new("app.Link", vec![Value::Int(7)])).unwrap();
        tree.set_attr(root, "mNext", Value::Object(short)).unwrap();
        let fields = walk_tree(&tree, &profile);
        assert_eq!(paths(&fields), vec!["mValue", "mNext.mValue"]);
    }

    #[test]
    fn foreign_types_are_not_recursed() {
        let profile = SchemaProfile::default();
        let tree = spider_tree(Layout::Current);
        let fields = walk_tree(&tree, &profile);
        assert!(fields.keys().all(|p| !p.starts_with("mLocale")));
        assert!(tree.registry().has_type(fixture::LOCALE));
    }
}
