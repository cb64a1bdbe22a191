//! Tree-level diff through the logical view.

use sfconfig_schema::VirtualLayer;
use sfconfig_types::ConfigTree;
use sfconfig_walk::logical_fields;
use tracing::debug;

use crate::field_diff::{diff_fields, FieldsDiff};

/// Compare two trees through the same virtual layer.
///
/// Both trees are reduced to their logical field maps first, so a legacy
/// tree and a current tree with equal settings compare equal on every
/// virtual path. Physical attributes backing a virtual field or rule
/// collection on either side are left out; their changes surface once,
/// under the virtual path.
pub fn diff_trees(
    a: &ConfigTree,
    b: &ConfigTree,
    layer: &VirtualLayer<'_>,
    prefix: Option<&str>,
) -> FieldsDiff {
    let mut fields_a = logical_fields(a, layer);
    let mut fields_b = logical_fields(b, layer);
    for path in layer.backing_paths(a).into_iter().chain(layer.backing_paths(b)) {
        fields_a.shift_remove(&path);
        fields_b.shift_remove(&path);
    }
    let diff = diff_fields(&fields_a, &fields_b, prefix);
    debug!(
        paths_a = fields_a.len(),
        paths_b = fields_b.len(),
        differences = diff.len(),
        "trees compared"
    );
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfconfig_patch::{PatchEngine, PatchSet};
    use sfconfig_schema::SchemaProfile;
    use sfconfig_types::fixture::{spider_tree, Layout};
    use sfconfig_types::{ChangeRecord, Value};

    use crate::FieldDiff;

    #[test]
    fn rendering_mode_only_difference_is_one_scalar_record() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let a = spider_tree(Layout::Current);
        let mut b = spider_tree(Layout::Current);
        layer.set_rendering_mode(&mut b, "JAVASCRIPT").unwrap();

        let diff = diff_trees(&a, &b, &layer, None);
        assert_eq!(
            diff.differences,
            vec![FieldDiff::Scalar {
                path: "mCrawlConfig.mRenderingMode".into(),
                value_a: json!("HTML"),
                value_b: json!("JAVASCRIPT"),
            }]
        );
    }

    #[test]
    fn legacy_rendering_mode_diffs_through_the_virtual_field() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let a = spider_tree(Layout::Legacy);
        let mut b = spider_tree(Layout::Legacy);
        layer.set_rendering_mode(&mut b, "JAVASCRIPT").unwrap();

        let diff = diff_trees(&a, &b, &layer, Some("mCrawlConfig.mRenderingMode"));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.scalars(), 1);
    }

    #[test]
    fn identical_trees_have_no_differences() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let tree = spider_tree(Layout::Legacy);
        assert!(diff_trees(&tree, &tree.clone(), &layer, None).is_empty());
    }

    #[test]
    fn exclude_list_changes_diff_as_lists() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let a = spider_tree(Layout::Current);
        let mut b = a.clone();
        layer
            .set_exclude_list(&mut b, &["*.jpg".to_string(), "*.png".to_string()])
            .unwrap();
        let diff = diff_trees(&a, &b, &layer, Some("mExcludeManager."));
        let paths: Vec<_> = diff.differences.iter().map(FieldDiff::path).collect();
        assert_eq!(
            paths,
            vec!["mExcludeManager.mExcludePatterns", "mExcludeManager.mExcludeUrls"]
        );
        assert_eq!(diff.lists(), 2);
    }

    #[test]
    fn rediffing_a_patch_reproduces_its_changes() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let before = spider_tree(Layout::Current);
        let mut after = before.clone();
        let patches = PatchSet::from_value(json!({
            "extractions": [{"op": "clear"}],
            "custom_searches": [{"op": "add", "name": "Missing H1", "query": "h1"}],
            "mCrawlConfig.mMaxUrls": 1000,
            "mCrawlConfig.mMaxDepth": 7,
            "mCrawlConfig.mMaxThreads": 12,
            "mCrawlConfig.mCrawlDelay": 1.5,
            "mUserAgentConfig.mPreset": "googlebot",
            "mCrawlConfig.mIncludePatterns": {"op": "append", "values": ["/docs/.*"]},
            "mExcludeManager.mExcludePatterns": {"op": "append", "values": ["*.pdf"]},
        }))
        .unwrap();
        let outcome = PatchEngine::with_layer(layer.clone())
            .apply(&mut after, &patches)
            .unwrap();
        assert_eq!(outcome.changes.len(), 10);

        assert_rediff_matches(&before, &after, &layer, &outcome.changes);
    }

    #[test]
    fn rediffing_a_legacy_rendering_patch_reproduces_its_change() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let before = spider_tree(Layout::Legacy);
        let mut after = before.clone();
        let patches = PatchSet::from_value(json!({
            "mCrawlConfig.mRenderingMode": "JAVASCRIPT",
            "mCrawlConfig.mMaxDepth": 0,
        }))
        .unwrap();
        let outcome = PatchEngine::with_layer(layer.clone())
            .apply(&mut after, &patches)
            .unwrap();
        assert_eq!(outcome.changes.len(), 1);

        assert_rediff_matches(&before, &after, &layer, &outcome.changes);
    }

    fn assert_rediff_matches(
        before: &ConfigTree,
        after: &ConfigTree,
        layer: &VirtualLayer<'_>,
        changes: &[ChangeRecord],
    ) {
        let diff = diff_trees(before, after, layer, None);
        let mut diff_paths: Vec<_> = diff.differences.iter().map(FieldDiff::path).collect();
        let mut change_paths: Vec<_> = changes.iter().map(|c| c.path.as_str()).collect();
        diff_paths.sort_unstable();
        change_paths.sort_unstable();
        assert_eq!(diff_paths, change_paths);

        for change in changes {
            match diff.get(&change.path) {
                Some(FieldDiff::Scalar { value_a, value_b, .. }) => {
                    assert_eq!(value_a, &change.before, "{}", change.path);
                    assert_eq!(value_b, &change.after, "{}", change.path);
                }
                Some(_) => {}
                None => panic!("no difference at {}", change.path),
            }
        }
    }

    #[test]
    fn absent_side_compares_as_null() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let a = spider_tree(Layout::Current);
        let mut b = a.clone();
        let root = b.root();
        b.set_attr(root, "mUserAgentConfig", Value::Null).unwrap();

        let diff = diff_trees(&a, &b, &layer, Some("mUserAgentConfig"));
        assert_eq!(diff.len(), 2);
        assert_eq!(
            diff.get("mUserAgentConfig.mUserAgent").unwrap(),
            &FieldDiff::Scalar {
                path: "mUserAgentConfig.mUserAgent".into(),
                value_a: json!("Screaming Frog SEO Spider"),
                value_b: serde_json::Value::Null,
            }
        );
    }
}
