use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{SchemaError, SchemaResult};
use crate::rules::RuleKind;

/// A patch key that addresses a rule collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionBinding {
    pub kind: RuleKind,
    /// Short patch key, e.g. `extractions`.
    pub key: String,
    /// Logical path reported by inspect and diff.
    pub virtual_path: String,
}

impl CollectionBinding {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            key: kind.key().to_string(),
            virtual_path: kind.virtual_path().to_string(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.key == key || self.virtual_path == key
    }
}

/// An attribute the walker skips under a particular owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    /// Attribute name of the owning object (last prefix segment).
    pub owner: String,
    pub attr: String,
}

impl Exclusion {
    pub fn new(owner: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            attr: attr.into(),
        }
    }
}

/// Schema knowledge handed to the walker, the virtual layer and the patch
/// engine: what may be edited, what is masked, what is skipped.
///
/// The default is the crawler profile. A TOML file can replace any part of
/// it; omitted keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaProfile {
    /// Scalar paths (physical or virtual) accepted by the patch engine.
    pub allowlist: Vec<String>,
    /// List paths accepted by the patch engine; edited with list ops.
    pub list_allowlist: Vec<String>,
    /// Rule collections and the keys that address them.
    pub collections: Vec<CollectionBinding>,
    /// Substrings that mark a path as sensitive in inspect output.
    pub sensitive_keys: Vec<String>,
    pub redaction_marker: String,
    /// Attributes the walker never reports directly.
    pub exclusions: Vec<Exclusion>,
    /// Alternative physical spellings of an attribute, tried in order.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Type-name prefixes the walker never recurses into.
    pub foreign_prefixes: Vec<String>,
    /// Maximum recursion depth of a walk.
    pub max_depth: usize,
}

const DEFAULT_ALLOWLIST: &[&str] = &[
    "mCrawlConfig.mMaxUrls",
    "mCrawlConfig.mMaxDepth",
    "mCrawlConfig.mMaxThreads",
    "mCrawlConfig.mRobotsTxtMode",
    "mCrawlConfig.mRespectCanonical",
    "mCrawlConfig.mRenderingMode",
    "mCrawlConfig.mCrawlDelay",
    "mCrawlConfig.mCrawlCSS",
    "mCrawlConfig.mStoreCSS",
    "mCrawlConfig.mCrawlJavaScript",
    "mCrawlConfig.mStoreJavaScript",
    "mCrawlConfig.mStoreOriginalHtml",
    "mCrawlConfig.mStoreRenderedHtml",
    "mCrawlConfig.mExtractHttpHeader",
    "mCrawlConfig.mExtractCookies",
    "mCrawlConfig.mInspectAccessibility",
    "mUserAgentConfig.mUserAgent",
    "mUserAgentConfig.mPreset",
    "mContentConfig.mMinContentLength",
    "mLanguageToolConfig.mSpellCheckEnabled",
    "mLanguageToolConfig.mGrammarCheckEnabled",
    "mDuplicateConfig.mNearDuplicateChecking",
    "mDuplicateConfig.mNearDuplicateThreshold",
    "mSpiderStructuredDataConfig.mExtractJsonLd",
    "mSpiderStructuredDataConfig.mExtractMicrodata",
    "mSpiderStructuredDataConfig.mExtractRdfa",
    "mSpiderStructuredDataConfig.mGoogleValidation",
    "mSpiderStructuredDataConfig.mSchemaDotOrgValidation",
    "mSpiderStructuredDataConfig.mCaseSensitiveValidation",
    "mPerformanceConfig.mLimitPerformance",
    "mPerformanceConfig.mUrlRequestsPerSecond",
];

const DEFAULT_LIST_ALLOWLIST: &[&str] = &[
    "mExcludeManager.mExcludePatterns",
    "mExcludeManager.mExcludeUrls",
    "mCrawlConfig.mIncludePatterns",
    "mCrawlConfig.mAllowedDomains",
];

const DEFAULT_SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "apikey", "api_key", "auth"];

pub const DEFAULT_REDACTION_MARKER: &str = "***REDACTED***";

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SchemaProfile {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("mExcludeManager".to_string(), vec!["mExcludeManger".to_string()]);
        Self {
            allowlist: owned(DEFAULT_ALLOWLIST),
            list_allowlist: owned(DEFAULT_LIST_ALLOWLIST),
            collections: RuleKind::ALL.iter().copied().map(CollectionBinding::new).collect(),
            sensitive_keys: owned(DEFAULT_SENSITIVE_KEYS),
            redaction_marker: DEFAULT_REDACTION_MARKER.to_string(),
            exclusions: vec![
                Exclusion::new("mCustomExtractionConfig", "mFilters"),
                Exclusion::new("mExcludeManger", "mRawExcludeListString"),
                Exclusion::new("mExcludeManager", "mRawExcludeListString"),
            ],
            aliases,
            foreign_prefixes: owned(&["java.", "javax.", "org."]),
            max_depth: 10,
        }
    }
}

impl SchemaProfile {
    /// Parse a profile from TOML text.
    pub fn from_toml_str(text: &str) -> SchemaResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a profile from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::ProfileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    // -----------------------------------------------------------------------
    // Edit allowlist
    // -----------------------------------------------------------------------

    /// Whether a logical path may be patched.
    pub fn is_editable(&self, path: &str) -> bool {
        self.allowlist.iter().any(|p| p == path)
            || self.is_list_field(path)
            || self.collection_for_key(path).is_some()
    }

    /// Whether a path is edited with list operations.
    pub fn is_list_field(&self, path: &str) -> bool {
        self.list_allowlist.iter().any(|p| p == path)
    }

    /// Every accepted patch key: scalar allowlist, list allowlist, then each
    /// collection's short key followed by its virtual path.
    pub fn allowed_fields(&self) -> Vec<String> {
        let mut fields = self.allowlist.clone();
        fields.extend(self.list_allowlist.iter().cloned());
        for binding in &self.collections {
            fields.push(binding.key.clone());
            fields.push(binding.virtual_path.clone());
        }
        fields
    }

    /// The collection addressed by a short key or virtual path.
    pub fn collection_for_key(&self, key: &str) -> Option<&CollectionBinding> {
        self.collections.iter().find(|b| b.matches(key))
    }

    /// The binding of a rule kind, if the profile exposes it.
    pub fn collection(&self, kind: RuleKind) -> Option<&CollectionBinding> {
        self.collections.iter().find(|b| b.kind == kind)
    }

    // -----------------------------------------------------------------------
    // Masking
    // -----------------------------------------------------------------------

    /// Case-insensitive substring match of any sensitive key against the
    /// whole dotted path.
    pub fn is_sensitive(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        self.sensitive_keys
            .iter()
            .any(|key| lower.contains(&key.to_lowercase()))
    }

    /// Display value for inspect output. Null stays null.
    pub fn mask(&self, path: &str, value: Json) -> Json {
        if !value.is_null() && self.is_sensitive(path) {
            Json::String(self.redaction_marker.clone())
        } else {
            value
        }
    }

    // -----------------------------------------------------------------------
    // Walker knobs
    // -----------------------------------------------------------------------

    pub fn is_foreign(&self, type_name: &str) -> bool {
        self.foreign_prefixes
            .iter()
            .any(|prefix| type_name.starts_with(prefix.as_str()))
    }

    /// Whether `attr` is skipped under the object reached by `prefix`.
    pub fn is_excluded(&self, prefix: &str, attr: &str) -> bool {
        let owner = prefix.rsplit('.').next().unwrap_or(prefix);
        self.exclusions
            .iter()
            .any(|e| e.attr == attr && e.owner == owner)
    }

    /// Alternative spellings of an attribute name.
    pub fn aliases_for(&self, attr: &str) -> &[String] {
        self.aliases.get(attr).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_allowlist_sizes() {
        let profile = SchemaProfile::default();
        assert_eq!(profile.allowlist.len(), 31);
        assert_eq!(profile.list_allowlist.len(), 4);
        assert_eq!(profile.allowed_fields().len(), 31 + 4 + 6);
    }

    #[test]
    fn allowed_fields_order() {
        let fields = SchemaProfile::default().allowed_fields();
        assert_eq!(fields[0], "mCrawlConfig.mMaxUrls");
        assert_eq!(fields[31], "mExcludeManager.mExcludePatterns");
        assert_eq!(
            &fields[35..],
            &[
                "extractions",
                "mCustomExtractionConfig.extractions",
                "custom_searches",
                "mCustomSearchConfig.searches",
                "custom_javascript",
                "mCustomJavaScriptConfig.javascript",
            ]
        );
    }

    #[test]
    fn editable_paths() {
        let profile = SchemaProfile::default();
        assert!(profile.is_editable("mCrawlConfig.mMaxThreads"));
        assert!(profile.is_editable("mExcludeManager.mExcludeUrls"));
        assert!(profile.is_editable("mCustomSearchConfig.searches"));
        assert!(!profile.is_editable("mProxyConfig.mPassword"));
        assert!(!profile.is_editable("mCrawlConfig"));
    }

    #[test]
    fn masking_matches_anywhere_in_path() {
        let profile = SchemaProfile::default();
        assert_eq!(
            profile.mask("mProxyConfig.mPassword", json!("hunter2")),
            json!("***REDACTED***")
        );
        // "auth" inside an unrelated segment still redacts.
        assert_eq!(
            profile.mask("mAuthorConfig.mName", json!("x")),
            json!("***REDACTED***")
        );
        assert_eq!(profile.mask("mProxyConfig.mPassword", json!(null)), json!(null));
        assert_eq!(profile.mask("mCrawlConfig.mMaxThreads", json!(5)), json!(5));
    }

    #[test]
    fn exclusions_match_last_prefix_segment() {
        let profile = SchemaProfile::default();
        assert!(profile.is_excluded("mCustomExtractionConfig", "mFilters"));
        assert!(profile.is_excluded("mExcludeManger", "mRawExcludeListString"));
        assert!(!profile.is_excluded("mCustomSearchConfig", "mFilters"));
        assert!(!profile.is_excluded("", "mFilters"));
    }

    #[test]
    fn foreign_prefixes() {
        let profile = SchemaProfile::default();
        assert!(profile.is_foreign("java.util.Locale"));
        assert!(profile.is_foreign("org.jsoup.Node"));
        assert!(!profile.is_foreign("seo.spider.config.CrawlConfig"));
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let profile = SchemaProfile::from_toml_str(
            r#"
            allowlist = ["mCrawlConfig.mMaxThreads"]
            max_depth = 4

            [aliases]
            mCrawlConfig = ["mCrawlCfg"]
            "#,
        )
        .unwrap();
        assert_eq!(profile.allowlist, vec!["mCrawlConfig.mMaxThreads"]);
        assert_eq!(profile.max_depth, 4);
        assert_eq!(profile.aliases_for("mCrawlConfig"), &["mCrawlCfg".to_string()]);
        assert!(profile.aliases_for("mExcludeManager").is_empty());
        assert_eq!(profile.list_allowlist.len(), 4);
    }

    #[test]
    fn toml_collection_bindings() {
        let profile = SchemaProfile::from_toml_str(
            r#"
            [[collections]]
            kind = "custom_search"
            key = "searches"
            virtual_path = "mCustomSearchConfig.searches"
            "#,
        )
        .unwrap();
        assert_eq!(profile.collections.len(), 1);
        assert_eq!(
            profile.collection_for_key("searches").map(|b| b.kind),
            Some(RuleKind::CustomSearch)
        );
        assert!(profile.collection(RuleKind::Extraction).is_none());
    }

    #[test]
    fn profile_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "max_depth = 3\n").unwrap();
        assert_eq!(SchemaProfile::from_path(&path).unwrap().max_depth, 3);

        let err = SchemaProfile::from_path(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.kind(), sfconfig_types::ErrorKind::Io);

        let err = SchemaProfile::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert_eq!(err.kind(), sfconfig_types::ErrorKind::Parse);
    }
}
