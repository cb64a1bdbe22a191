//! The virtual field layer: a stable logical schema over drifting physical
//! attributes.

use serde_json::Value as Json;
use sfconfig_types::{ConfigTree, FieldInfo, FieldMap, FieldType};

use crate::access;
use crate::error::{SchemaError, SchemaResult};
use crate::exclude;
use crate::limits::CrawlLimit;
use crate::profile::SchemaProfile;
use crate::rendering;
use crate::rules::{read_rules, RuleCatalog, RuleKind, RuleList, RuleRecord};

/// A logical scalar or list field backed by other physical attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VirtualField {
    Limit(CrawlLimit),
    RenderingMode,
    ExcludePatterns,
    ExcludeUrls,
}

impl VirtualField {
    /// Overlay order.
    pub const ALL: [VirtualField; 5] = [
        VirtualField::ExcludePatterns,
        VirtualField::ExcludeUrls,
        VirtualField::Limit(CrawlLimit::MaxUrls),
        VirtualField::Limit(CrawlLimit::MaxDepth),
        VirtualField::RenderingMode,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Limit(limit) => limit.path(),
            Self::RenderingMode => rendering::PATH,
            Self::ExcludePatterns => exclude::PATTERNS_PATH,
            Self::ExcludeUrls => exclude::URLS_PATH,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.path() == path)
    }

    pub fn is_list(self) -> bool {
        matches!(self, Self::ExcludePatterns | Self::ExcludeUrls)
    }

    /// This field followed by every field sharing its backing.
    pub fn with_mirrors(self) -> Vec<VirtualField> {
        match self {
            Self::ExcludePatterns => vec![self, Self::ExcludeUrls],
            Self::ExcludeUrls => vec![self, Self::ExcludePatterns],
            _ => vec![self],
        }
    }
}

/// Getters and setters for virtual fields and rule collections, bound to a
/// schema profile and a rule catalog.
#[derive(Clone, Debug)]
pub struct VirtualLayer<'p> {
    profile: &'p SchemaProfile,
    catalog: RuleCatalog,
}

impl<'p> VirtualLayer<'p> {
    pub fn new(profile: &'p SchemaProfile) -> Self {
        Self {
            profile,
            catalog: RuleCatalog::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: RuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn profile(&self) -> &'p SchemaProfile {
        self.profile
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    // -----------------------------------------------------------------------
    // Getters
    // -----------------------------------------------------------------------

    /// Logical value of a virtual field; `None` when its prerequisites are
    /// absent.
    pub fn read(&self, tree: &ConfigTree, field: VirtualField) -> Option<FieldInfo> {
        match field {
            VirtualField::Limit(limit) => {
                let crawl = access::crawl_config(tree, self.profile)?;
                let value = limit.read(tree, crawl)?;
                Some(FieldInfo::scalar(FieldType::Int, Json::from(value)))
            }
            VirtualField::RenderingMode => {
                let crawl = access::crawl_config(tree, self.profile)?;
                let mode = rendering::read(tree, crawl)?;
                Some(FieldInfo::enumeration(
                    Json::String(mode),
                    rendering::MODES.iter().map(|m| m.to_string()).collect(),
                ))
            }
            VirtualField::ExcludePatterns | VirtualField::ExcludeUrls => {
                let manager = exclude::exclude_manager(tree, self.profile)?;
                let items = exclude::read(tree, manager);
                Some(FieldInfo::list(
                    FieldType::StringList,
                    items.into_iter().map(Json::String).collect(),
                ))
            }
        }
    }

    /// Logical records of a rule collection.
    pub fn rules(&self, tree: &ConfigTree, kind: RuleKind) -> Option<Vec<RuleRecord>> {
        read_rules(tree, self.profile, &self.catalog, kind)
    }

    /// A rule collection as a list-shaped field.
    pub fn read_collection(&self, tree: &ConfigTree, kind: RuleKind) -> Option<FieldInfo> {
        let records = self.rules(tree, kind)?;
        Some(FieldInfo::list(
            kind.field_type(),
            records.iter().map(RuleRecord::to_json).collect(),
        ))
    }

    /// Add every virtual field and rule collection the walk did not
    /// discover. Existing paths are never overwritten.
    pub fn overlay(&self, tree: &ConfigTree, fields: &mut FieldMap) {
        for field in VirtualField::ALL {
            if fields.contains_key(field.path()) {
                continue;
            }
            if let Some(info) = self.read(tree, field) {
                fields.insert(field.path().to_string(), info);
            }
        }
        for binding in &self.profile.collections {
            if fields.contains_key(&binding.virtual_path) {
                continue;
            }
            if let Some(info) = self.read_collection(tree, binding.kind) {
                fields.insert(binding.virtual_path.clone(), info);
            }
        }
    }

    /// Walker paths of the physical attributes that virtual fields and rule
    /// collections present under their own paths.
    ///
    /// Only fields readable on this tree contribute. The direct rendering
    /// attribute is its own virtual path and is never listed.
    pub fn backing_paths(&self, tree: &ConfigTree) -> Vec<String> {
        let root = tree.root();
        let mut paths = Vec::new();

        if let Some(crawl) = access::crawl_config(tree, self.profile) {
            let prefix = access::resolve_attr(tree, self.profile, root, access::CRAWL_CONFIG)
                .unwrap_or(access::CRAWL_CONFIG);
            for limit in CrawlLimit::ALL {
                if limit.read(tree, crawl).is_some() {
                    paths.extend(limit.backing_attrs().map(|attr| format!("{prefix}.{attr}")));
                }
            }
            if rendering::uses_legacy(tree, crawl) {
                paths.push(format!("{prefix}.{}", rendering::LEGACY_ATTR));
            }
        }

        for binding in &self.profile.collections {
            if self.rules(tree, binding.kind).is_none() {
                continue;
            }
            if let Some(shape) = self.catalog.resolve(tree, binding.kind) {
                let container = access::resolve_attr(tree, self.profile, root, &shape.container)
                    .unwrap_or(&shape.container);
                paths.push(format!("{container}.{}", shape.list_attr));
            }
        }
        paths
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Whether a patch to this field goes through its setter. Otherwise it
    /// falls through to the generic physical path.
    pub fn routes(&self, tree: &ConfigTree, field: VirtualField) -> bool {
        match field {
            VirtualField::Limit(limit) => access::crawl_config(tree, self.profile)
                .is_some_and(|crawl| limit.read(tree, crawl).is_some()),
            VirtualField::RenderingMode => access::crawl_config(tree, self.profile)
                .is_some_and(|crawl| rendering::uses_legacy(tree, crawl)),
            VirtualField::ExcludePatterns | VirtualField::ExcludeUrls => {
                exclude::exclude_manager(tree, self.profile).is_some()
            }
        }
    }

    pub fn set_limit(&self, tree: &mut ConfigTree, limit: CrawlLimit, value: i32) -> SchemaResult<()> {
        let crawl = access::crawl_config(tree, self.profile)
            .ok_or_else(|| SchemaError::unsupported(limit.name()))?;
        limit.write(tree, crawl, value)
    }

    pub fn set_rendering_mode(&self, tree: &mut ConfigTree, mode: &str) -> SchemaResult<()> {
        let crawl = access::crawl_config(tree, self.profile)
            .ok_or_else(|| SchemaError::unsupported(rendering::DIRECT_ATTR))?;
        rendering::write(tree, crawl, mode)
    }

    pub fn exclude_list(&self, tree: &ConfigTree) -> Option<Vec<String>> {
        let manager = exclude::exclude_manager(tree, self.profile)?;
        Some(exclude::read(tree, manager))
    }

    pub fn set_exclude_list(&self, tree: &mut ConfigTree, items: &[String]) -> SchemaResult<()> {
        let manager = exclude::exclude_manager(tree, self.profile)
            .ok_or_else(|| SchemaError::unsupported("mExcludeManager"))?;
        exclude::write(tree, manager, items)
    }

    /// Open a rule collection for editing.
    pub fn open_rules(&self, tree: &ConfigTree, kind: RuleKind) -> SchemaResult<RuleList> {
        RuleList::open(tree, self.profile, &self.catalog, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfconfig_types::fixture::{spider_tree, Layout};
    use sfconfig_types::Value;

    #[test]
    fn paths_round_trip() {
        for field in VirtualField::ALL {
            assert_eq!(VirtualField::from_path(field.path()), Some(field));
        }
        assert_eq!(VirtualField::from_path("mCrawlConfig.mMaxThreads"), None);
    }

    #[test]
    fn overlay_fills_gaps_on_legacy_tree() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let tree = spider_tree(Layout::Legacy);
        let mut fields = FieldMap::new();
        layer.overlay(&tree, &mut fields);

        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "mExcludeManager.mExcludePatterns",
                "mExcludeManager.mExcludeUrls",
                "mCrawlConfig.mMaxUrls",
                "mCrawlConfig.mMaxDepth",
                "mCrawlConfig.mRenderingMode",
                "mCustomExtractionConfig.extractions",
                "mCustomSearchConfig.searches",
                "mCustomJavaScriptConfig.javascript",
            ]
        );
        let rendering = &fields["mCrawlConfig.mRenderingMode"];
        assert_eq!(rendering.value, json!("HTML"));
        assert_eq!(
            rendering.enum_options.as_deref(),
            Some(&["HTML".to_string(), "JAVASCRIPT".to_string()][..])
        );
        assert_eq!(fields["mCrawlConfig.mMaxUrls"].value, json!(500));
        assert_eq!(fields["mExcludeManager.mExcludeUrls"].length, Some(1));
        assert_eq!(fields["mCustomSearchConfig.searches"].length, Some(0));
    }

    #[test]
    fn overlay_never_overwrites() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let tree = spider_tree(Layout::Current);
        let mut fields = FieldMap::new();
        fields.insert(
            "mCrawlConfig.mMaxUrls".into(),
            FieldInfo::scalar(FieldType::Int, json!(12)),
        );
        layer.overlay(&tree, &mut fields);
        assert_eq!(fields["mCrawlConfig.mMaxUrls"].value, json!(12));
        assert_eq!(fields.get_index_of("mCrawlConfig.mMaxUrls"), Some(0));
    }

    #[test]
    fn routing_depends_on_layout() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let legacy = spider_tree(Layout::Legacy);
        let current = spider_tree(Layout::Current);
        assert!(layer.routes(&legacy, VirtualField::RenderingMode));
        assert!(!layer.routes(&current, VirtualField::RenderingMode));
        assert!(layer.routes(&current, VirtualField::Limit(CrawlLimit::MaxUrls)));

        let mut bare = spider_tree(Layout::Current);
        let root = bare.root();
        bare.set_attr(root, "mExcludeManager", Value::Null).unwrap();
        assert!(!layer.routes(&bare, VirtualField::ExcludePatterns));
        assert!(layer.read(&bare, VirtualField::ExcludeUrls).is_none());
    }

    #[test]
    fn backing_paths_cover_limits_rendering_and_rule_lists() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);

        let current = layer.backing_paths(&spider_tree(Layout::Current));
        for path in [
            "mCrawlConfig.mLimitSearchTotal",
            "mCrawlConfig.mSearchTotalLimit",
            "mCrawlConfig.mLimitSearchDepth",
            "mCrawlConfig.mSearchDepthLimit",
            "mCustomExtractionConfig.mFilters",
            "mCustomSearchConfig.mSearches",
            "mCustomJavaScriptConfig.mJsSnippets",
        ] {
            assert!(current.iter().any(|p| p == path), "{path}");
        }
        assert!(!current.iter().any(|p| p == rendering::PATH));
        assert!(!current.iter().any(|p| p.ends_with(rendering::LEGACY_ATTR)));

        let legacy = layer.backing_paths(&spider_tree(Layout::Legacy));
        assert!(legacy.iter().any(|p| p == "mCrawlConfig.mCrawlerMode"));

        let mut bare = spider_tree(Layout::Current);
        let root = bare.root();
        bare.set_attr(root, "mCrawlConfig", Value::Null).unwrap();
        assert!(!layer.backing_paths(&bare).iter().any(|p| p.starts_with("mCrawlConfig.")));
    }

    #[test]
    fn exclude_fields_mirror_each_other() {
        assert_eq!(
            VirtualField::ExcludeUrls.with_mirrors(),
            vec![VirtualField::ExcludeUrls, VirtualField::ExcludePatterns]
        );
        assert_eq!(VirtualField::RenderingMode.with_mirrors(), vec![VirtualField::RenderingMode]);
    }

    #[test]
    fn setters_write_through() {
        let profile = SchemaProfile::default();
        let layer = VirtualLayer::new(&profile);
        let mut tree = spider_tree(Layout::Legacy);
        layer
            .set_exclude_list(&mut tree, &["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(layer.exclude_list(&tree), Some(vec!["a".to_string(), "b".to_string()]));

        layer.set_rendering_mode(&mut tree, "JAVASCRIPT").unwrap();
        assert_eq!(
            layer.read(&tree, VirtualField::RenderingMode).unwrap().value,
            json!("JAVASCRIPT")
        );

        layer.set_limit(&mut tree, CrawlLimit::MaxDepth, 4).unwrap();
        assert_eq!(
            layer.read(&tree, VirtualField::Limit(CrawlLimit::MaxDepth)).unwrap().value,
            json!(4)
        );
    }
}
