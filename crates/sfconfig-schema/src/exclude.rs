//! Exclude list stored as one raw newline-delimited string.

use sfconfig_types::{ConfigTree, NodeId, Value};

use crate::error::SchemaResult;
use crate::profile::SchemaProfile;

pub const PATTERNS_PATH: &str = "mExcludeManager.mExcludePatterns";
pub const URLS_PATH: &str = "mExcludeManager.mExcludeUrls";

const MANAGER_ATTR: &str = "mExcludeManager";
const RAW_ATTR: &str = "mRawExcludeListString";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Split on line breaks, trim, drop empty lines.
pub fn parse_exclude_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join with the platform line terminator.
pub fn join_exclude_list(items: &[String]) -> String {
    items.join(LINE_ENDING)
}

/// The exclude manager object under either spelling. The misspelled
/// aliases win over the canonical name when a tree carries both.
pub fn exclude_manager(tree: &ConfigTree, profile: &SchemaProfile) -> Option<NodeId> {
    let root = tree.root();
    profile
        .aliases_for(MANAGER_ATTR)
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(MANAGER_ATTR))
        .find_map(|name| tree.child(root, name))
}

/// Current exclude list; a null raw string is an empty list.
pub fn read(tree: &ConfigTree, manager: NodeId) -> Vec<String> {
    tree.attr(manager, RAW_ATTR)
        .and_then(Value::display_text)
        .map(|raw| parse_exclude_list(&raw))
        .unwrap_or_default()
}

pub fn write(tree: &mut ConfigTree, manager: NodeId, items: &[String]) -> SchemaResult<()> {
    tree.set_attr(manager, RAW_ATTR, Value::Str(join_exclude_list(items)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfconfig_types::fixture::{self, spider_tree, Layout};
    use sfconfig_types::{AttrDef, AttrType, TypeDef};

    #[test]
    fn parse_handles_crlf_and_blank_lines() {
        assert_eq!(
            parse_exclude_list("  a.*\r\n\r\n b \n\n"),
            vec!["a.*".to_string(), "b".to_string()]
        );
        assert!(parse_exclude_list("   ").is_empty());
    }

    #[test]
    fn join_then_parse_is_stable() {
        let items = vec!["*.jpg".to_string(), "*.pdf".to_string()];
        assert_eq!(parse_exclude_list(&join_exclude_list(&items)), items);
    }

    #[test]
    fn manager_found_under_both_spellings() {
        let profile = SchemaProfile::default();
        for layout in [Layout::Current, Layout::Legacy] {
            let tree = spider_tree(layout);
            let manager = exclude_manager(&tree, &profile).unwrap();
            assert_eq!(read(&tree, manager), vec!["*.jpg".to_string()]);
        }
    }

    #[test]
    fn misspelled_manager_wins_when_both_exist() {
        let mut registry = fixture::registry(Layout::Current);
        let manager_ty = AttrType::Object(fixture::EXCLUDE_MANAGER.into());
        registry.register_type(TypeDef::new(
            fixture::SPIDER_CONFIG,
            vec![
                AttrDef::new("mExcludeManager", manager_ty.clone()),
                AttrDef::new("mExcludeManger", manager_ty),
            ],
        ));
        let mut tree = ConfigTree::new(registry, fixture::SPIDER_CONFIG).unwrap();
        let root = tree.root();
        for (attr, raw) in [("mExcludeManager", "canonical"), ("mExcludeManger", "alias")] {
            let manager = tree.instantiate(fixture::EXCLUDE_MANAGER).unwrap();
            tree.set_attr(manager, RAW_ATTR, Value::str(raw)).unwrap();
            tree.set_attr(root, attr, Value::Object(manager)).unwrap();
        }

        let profile = SchemaProfile::default();
        let manager = exclude_manager(&tree, &profile).unwrap();
        assert_eq!(read(&tree, manager), vec!["alias".to_string()]);
    }

    #[test]
    fn write_replaces_raw_string() {
        let profile = SchemaProfile::default();
        let mut tree = spider_tree(Layout::Legacy);
        let manager = exclude_manager(&tree, &profile).unwrap();
        write(&mut tree, manager, &["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(read(&tree, manager), vec!["x".to_string(), "y".to_string()]);

        write(&mut tree, manager, &[]).unwrap();
        assert!(read(&tree, manager).is_empty());
    }
}
