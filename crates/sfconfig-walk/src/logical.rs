//! The logical field set: physical walk, virtual overlay, editability.

use sfconfig_schema::VirtualLayer;
use sfconfig_types::{ConfigTree, FieldMap};
use tracing::debug;

use crate::walker::walk_tree;

/// Every logical field of `tree`.
///
/// The physical walk runs first; virtual fields and rule collections are
/// then added for paths the walk did not produce. Each field is marked
/// editable from the profile's allowlists.
pub fn logical_fields(tree: &ConfigTree, layer: &VirtualLayer<'_>) -> FieldMap {
    let profile = layer.profile();
    let mut fields = walk_tree(tree, profile);
    let physical = fields.len();
    layer.overlay(tree, &mut fields);

    for (path, info) in fields.iter_mut() {
        info.editable = profile.is_editable(path);
    }

    debug!(physical, virtual_fields = fields.len() - physical, "logical fields built");
    fields
}

/// Keep only paths starting with `prefix`; an empty prefix keeps all.
pub fn filter_prefix(fields: FieldMap, prefix: &str) -> FieldMap {
    if prefix.is_empty() {
        return fields;
    }
    fields
        .into_iter()
        .filter(|(path, _)| path.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfconfig_schema::SchemaProfile;
    use sfconfig_types::fixture::{spider_tree, Layout};
    use sfconfig_types::FieldType;

    #[test]
    fn physical_paths_come_first() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let fields = logical_fields(&spider_tree(Layout::Current), &layer);

        let first_virtual = fields.get_index_of("mExcludeManager.mExcludePatterns").unwrap();
        assert_eq!(fields.get_index_of("mConfigVersion"), Some(0));
        assert!(fields.get_index_of("mExtraHeaders").unwrap() < first_virtual);
        assert!(fields.contains_key("mCustomExtractionConfig.extractions"));
    }

    #[test]
    fn walked_rendering_mode_is_not_overlaid() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let fields = logical_fields(&spider_tree(Layout::Current), &layer);
        let rendering = &fields["mCrawlConfig.mRenderingMode"];
        assert_eq!(rendering.value, json!("HTML"));
        assert!(fields.get_index_of("mCrawlConfig.mRenderingMode").unwrap()
            < fields.get_index_of("mCrawlConfig.mMaxUrls").unwrap());
    }

    #[test]
    fn legacy_tree_presents_the_same_logical_fields() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let current = logical_fields(&spider_tree(Layout::Current), &layer);
        let legacy = logical_fields(&spider_tree(Layout::Legacy), &layer);

        for path in [
            "mCrawlConfig.mRenderingMode",
            "mCrawlConfig.mMaxUrls",
            "mCrawlConfig.mMaxDepth",
            "mExcludeManager.mExcludePatterns",
            "mCustomExtractionConfig.extractions",
        ] {
            assert_eq!(current[path].value, legacy[path].value, "{path}");
        }
        assert_eq!(legacy["mCrawlConfig.mMaxDepth"].value, json!(0));
    }

    #[test]
    fn editability_follows_allowlists() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let fields = logical_fields(&spider_tree(Layout::Current), &layer);

        assert!(fields["mCrawlConfig.mMaxThreads"].editable);
        assert!(fields["mCrawlConfig.mIncludePatterns"].editable);
        assert!(fields["mCustomSearchConfig.searches"].editable);
        assert!(!fields["mProxyConfig.mHost"].editable);
        assert!(!fields["mExtraHeaders"].editable);
    }

    #[test]
    fn collections_are_typed() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let fields = logical_fields(&spider_tree(Layout::Current), &layer);
        let extractions = &fields["mCustomExtractionConfig.extractions"];
        assert_eq!(extractions.ty, FieldType::ExtractionRules);
        assert_eq!(extractions.length, Some(1));
        assert_eq!(extractions.value[0]["name"], json!("Price"));
    }

    #[test]
    fn prefix_filter_is_a_plain_prefix_match() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let fields = logical_fields(&spider_tree(Layout::Current), &layer);
        let total = fields.len();

        let crawl = filter_prefix(fields.clone(), "mCrawlConfig.mMax");
        let keys: Vec<_> = crawl.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["mCrawlConfig.mMaxThreads", "mCrawlConfig.mMaxUrls", "mCrawlConfig.mMaxDepth"]
        );
        assert_eq!(filter_prefix(fields, "").len(), total);
    }
}
