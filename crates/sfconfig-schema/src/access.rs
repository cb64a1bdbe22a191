//! Alias-aware attribute lookup.
//!
//! A logical attribute name may be spelled differently by some releases;
//! lookups try the name itself and then each profile alias in order.

use sfconfig_types::{ConfigTree, NodeId, Value};

use crate::profile::SchemaProfile;

/// Crawl settings object under the root.
pub const CRAWL_CONFIG: &str = "mCrawlConfig";
/// Version string on the root object.
pub const CONFIG_VERSION: &str = "mConfigVersion";

fn candidates<'a>(profile: &'a SchemaProfile, name: &'a str) -> impl Iterator<Item = &'a str> {
    std::iter::once(name).chain(profile.aliases_for(name).iter().map(String::as_str))
}

/// The spelling of `name` that the node's type declares.
pub fn resolve_attr<'a>(
    tree: &ConfigTree,
    profile: &'a SchemaProfile,
    node: NodeId,
    name: &'a str,
) -> Option<&'a str> {
    candidates(profile, name).find(|candidate| tree.has_attr(node, candidate))
}

/// First non-null nested object among the spellings of `name`.
pub fn child(tree: &ConfigTree, profile: &SchemaProfile, node: NodeId, name: &str) -> Option<NodeId> {
    candidates(profile, name).find_map(|candidate| tree.child(node, candidate))
}

/// Current value of `name`, trying aliases for undeclared spellings.
pub fn attr<'t>(
    tree: &'t ConfigTree,
    profile: &SchemaProfile,
    node: NodeId,
    name: &str,
) -> Option<&'t Value> {
    let actual = resolve_attr(tree, profile, node, name)?;
    tree.attr(node, actual)
}

/// The crawl settings object, if present.
pub fn crawl_config(tree: &ConfigTree, profile: &SchemaProfile) -> Option<NodeId> {
    child(tree, profile, tree.root(), CRAWL_CONFIG)
}

/// The tree's `mConfigVersion`, rendered as text.
pub fn config_version(tree: &ConfigTree) -> Option<String> {
    tree.attr(tree.root(), CONFIG_VERSION)
        .and_then(|v| tree.stringify(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfconfig_types::fixture::{spider_tree, Layout};

    #[test]
    fn alias_resolves_misspelled_manager() {
        let profile = SchemaProfile::default();
        let tree = spider_tree(Layout::Legacy);
        let root = tree.root();
        assert_eq!(
            resolve_attr(&tree, &profile, root, "mExcludeManager"),
            Some("mExcludeManger")
        );
        assert!(child(&tree, &profile, root, "mExcludeManager").is_some());
    }

    #[test]
    fn canonical_spelling_wins() {
        let profile = SchemaProfile::default();
        let tree = spider_tree(Layout::Current);
        assert_eq!(
            resolve_attr(&tree, &profile, tree.root(), "mExcludeManager"),
            Some("mExcludeManager")
        );
        assert_eq!(resolve_attr(&tree, &profile, tree.root(), "mNope"), None);
    }

    #[test]
    fn reads_version_and_crawl_config() {
        let profile = SchemaProfile::default();
        let tree = spider_tree(Layout::Legacy);
        assert_eq!(config_version(&tree).as_deref(), Some("16.7"));
        let crawl = crawl_config(&tree, &profile).unwrap();
        assert_eq!(attr(&tree, &profile, crawl, "mMaxThreads"), Some(&Value::Int(5)));
    }
}
