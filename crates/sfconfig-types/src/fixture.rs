//! Representative crawler config trees for tests.
//!
//! Two releases are modelled: a current layout with a direct rendering-mode
//! attribute, and a legacy layout with the tri-valued crawler mode and the
//! misspelled exclude-manager attribute. Both include a cycle back to the
//! root, a foreign-namespace object, a map, and a credential field.

use crate::registry::{AttrDef, EnumDef, TypeDef, TypeRegistry};
use crate::tree::{ConfigTree, NodeId};
use crate::value::{AttrType, Primitive, Value};

pub const SPIDER_CONFIG: &str = "seo.spider.config.SpiderConfig";
pub const CRAWL_CONFIG: &str = "seo.spider.config.CrawlConfig";
pub const USER_AGENT_CONFIG: &str = "seo.spider.config.UserAgentConfig";
pub const EXCLUDE_MANAGER: &str = "seo.spider.config.ExcludeManager";
pub const PROXY_CONFIG: &str = "seo.spider.config.ProxyConfig";
pub const EXTRACTION_CONFIG: &str = "seo.spider.config.custom.CustomExtractionConfig";
pub const EXTRACTION_INFO: &str = "seo.spider.extraction.CustomExtractionInfo";
pub const EXTRACTION_TYPE: &str = "seo.spider.extraction.CustomExtractionInfo$ExtractionType";
pub const EXTRACTION_DATA_TYPE: &str = "seo.spider.extraction.CustomExtractionInfo$DataType";
pub const SEARCH_CONFIG: &str = "seo.spider.config.custom.search.CustomSearchConfig";
pub const SEARCH_INFO: &str = "seo.spider.config.custom.search.CustomSearchInfo";
pub const SEARCH_MODE: &str = "seo.spider.config.custom.search.SearchMode";
pub const SEARCH_DATA_TYPE: &str = "seo.spider.config.custom.search.SearchDataType";
pub const SEARCH_SCOPE: &str = "seo.spider.config.custom.search.SearchScope";
pub const JS_CONFIG: &str = "seo.spider.config.custom.javascript.CustomJavaScriptConfig";
pub const JS_INFO: &str = "seo.spider.config.custom.javascript.CustomJavaScriptInfo";
pub const JS_TYPE: &str = "seo.spider.config.custom.javascript.id142006137";
pub const RENDERING_MODE: &str = "seo.spider.config.RenderingMode";
pub const CRAWLER_MODE: &str = "seo.spider.config.CrawlerMode";
pub const ROBOTS_MODE: &str = "seo.spider.config.RobotsTxtMode";
pub const UA_PRESET: &str = "seo.spider.config.UserAgentPreset";
pub const LOCALE: &str = "java.util.Locale";

/// Which release layout to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Direct `mRenderingMode`, correctly spelled `mExcludeManager`.
    Current,
    /// Legacy `mCrawlerMode`, misspelled `mExcludeManger`.
    Legacy,
}

impl Layout {
    pub fn exclude_attr(self) -> &'static str {
        match self {
            Self::Current => "mExcludeManager",
            Self::Legacy => "mExcludeManger",
        }
    }

    fn version(self) -> &'static str {
        match self {
            Self::Current => "20.1",
            Self::Legacy => "16.7",
        }
    }
}

fn attr(name: &str, ty: AttrType) -> AttrDef {
    AttrDef::new(name, ty)
}

fn obj(name: &str) -> AttrType {
    AttrType::Object(name.into())
}

fn en(name: &str) -> AttrType {
    AttrType::Enum(name.into())
}

const INT: AttrType = AttrType::Prim(Primitive::Int);
const BOOL: AttrType = AttrType::Prim(Primitive::Bool);

/// Type registry for the given layout.
pub fn registry(layout: Layout) -> TypeRegistry {
    let mut reg = TypeRegistry::new();

    reg.register_type(TypeDef::new(
        SPIDER_CONFIG,
        vec![
            attr("mConfigVersion", AttrType::Str),
            attr("mCrawlConfig", obj(CRAWL_CONFIG)),
            attr("mUserAgentConfig", obj(USER_AGENT_CONFIG)),
            attr(layout.exclude_attr(), obj(EXCLUDE_MANAGER)),
            attr("mCustomExtractionConfig", obj(EXTRACTION_CONFIG)),
            attr("mCustomSearchConfig", obj(SEARCH_CONFIG)),
            attr("mCustomJavaScriptConfig", obj(JS_CONFIG)),
            attr("mProxyConfig", obj(PROXY_CONFIG)),
            attr("mLocale", obj(LOCALE)),
            attr("mExtraHeaders", AttrType::Map),
            attr("mSchedule", obj("seo.spider.config.ScheduleConfig")),
        ],
    ));

    let mode_attr = match layout {
        Layout::Current => attr("mRenderingMode", en(RENDERING_MODE)),
        Layout::Legacy => attr("mCrawlerMode", en(CRAWLER_MODE)),
    };
    reg.register_type(TypeDef::new(
        CRAWL_CONFIG,
        vec![
            attr("mMaxThreads", INT),
            attr("mLimitSearchTotal", BOOL),
            attr("mSearchTotalLimit", INT),
            attr("mLimitSearchDepth", BOOL),
            attr("mSearchDepthLimit", INT),
            mode_attr,
            attr("mRobotsTxtMode", en(ROBOTS_MODE)),
            attr("mRespectCanonical", BOOL),
            attr("mCrawlDelay", AttrType::Boxed(Primitive::Double)),
            attr("mCrawlCSS", BOOL),
            attr("mStoreCSS", BOOL),
            attr("mIncludePatterns", AttrType::List),
            attr("mAllowedDomains", AttrType::List),
            attr("mParent", obj(SPIDER_CONFIG)),
        ],
    ));

    reg.register_type(TypeDef::new(
        USER_AGENT_CONFIG,
        vec![
            attr("mUserAgent", AttrType::Str),
            attr("mPreset", en(UA_PRESET)),
        ],
    ));
    reg.register_type(TypeDef::new(
        EXCLUDE_MANAGER,
        vec![attr("mRawExcludeListString", AttrType::Str)],
    ));
    reg.register_type(TypeDef::new(
        PROXY_CONFIG,
        vec![
            attr("mHost", AttrType::Str),
            attr("mPort", INT),
            attr("mPassword", AttrType::Str),
        ],
    ));
    reg.register_type(TypeDef::new(
        LOCALE,
        vec![attr("language", AttrType::Str)],
    ));
    reg.register_type(TypeDef::new(
        "seo.spider.config.ScheduleConfig",
        vec![attr("mCron", AttrType::Str)],
    ));

    reg.register_type(TypeDef::new(
        EXTRACTION_CONFIG,
        vec![attr("mFilters", AttrType::List)],
    ));
    reg.register_type(TypeDef::new(
        EXTRACTION_INFO,
        vec![
            attr("mName", AttrType::Str),
            attr("mExtractionType", en(EXTRACTION_TYPE)),
            attr("mDataType", en(EXTRACTION_DATA_TYPE)),
            attr("mExpression", AttrType::Str),
            attr("mAttribute", AttrType::Str),
        ],
    ));
    reg.register_type(TypeDef::new(
        SEARCH_CONFIG,
        vec![attr("mSearches", AttrType::List)],
    ));
    reg.register_type(TypeDef::new(
        SEARCH_INFO,
        vec![
            attr("mName", AttrType::Str),
            attr("mMode", en(SEARCH_MODE)),
            attr("mDataType", en(SEARCH_DATA_TYPE)),
            attr("mQuery", AttrType::Str),
            attr("mCaseSensitiveTextSearch", BOOL),
            attr("mScope", en(SEARCH_SCOPE)),
            attr("mXPath", AttrType::Str),
        ],
    ));
    reg.register_type(TypeDef::new(
        JS_CONFIG,
        vec![attr("mJsSnippets", AttrType::List)],
    ));
    reg.register_type(TypeDef::new(
        JS_INFO,
        vec![
            attr("mName", AttrType::Str),
            attr("mType", en(JS_TYPE)),
            attr("mJavaScript", AttrType::Str),
            attr("mActionTimeoutSecs", INT),
            attr("mContentTypes", AttrType::Str),
        ],
    ));

    reg.register_enum(EnumDef::new(RENDERING_MODE, ["HTML", "JAVASCRIPT"]))
        .register_enum(EnumDef::new(CRAWLER_MODE, ["STANDARD", "RENDER", "AJAX"]))
        .register_enum(EnumDef::new(ROBOTS_MODE, ["RESPECT", "IGNORE", "IGNORE_REPORT"]))
        .register_enum(EnumDef::new(UA_PRESET, ["SCREAMING_FROG", "GOOGLEBOT", "CUSTOM"]))
        .register_enum(EnumDef::new(EXTRACTION_TYPE, ["XPATH", "CSSPATH", "REGEX"]))
        .register_enum(EnumDef::new(
            EXTRACTION_DATA_TYPE,
            ["INNER_TEXT", "INNER_HTML", "OUTER_HTML", "FUNCTION_VALUE"],
        ))
        .register_enum(EnumDef::new(SEARCH_MODE, ["CONTAINS", "ABSENT"]))
        .register_enum(EnumDef::new(SEARCH_DATA_TYPE, ["TEXT", "REGEX"]))
        .register_enum(EnumDef::new(SEARCH_SCOPE, ["HTML", "TEXT", "CONTENT"]))
        .register_enum(EnumDef::new(JS_TYPE, ["EXTRACTION", "ACTION"]));
    reg
}

fn set(tree: &mut ConfigTree, id: NodeId, name: &str, value: Value) {
    tree.set_attr(id, name, value)
        .expect("fixture attribute is declared");
}

fn new_node(tree: &mut ConfigTree, ty: &str) -> NodeId {
    tree.instantiate(ty).expect("fixture type is registered")
}

/// A fully populated tree in the given layout.
///
/// Crawl limits: max URLs 500 (limited), max depth unlimited. Rendering is
/// `HTML` (current) or `STANDARD` (legacy). Exclude list: `*.jpg`. One
/// extraction rule named `Price`; no searches or scripts.
pub fn spider_tree(layout: Layout) -> ConfigTree {
    let mut tree =
        ConfigTree::new(registry(layout), SPIDER_CONFIG).expect("root type is registered");
    let root = tree.root();
    set(&mut tree, root, "mConfigVersion", Value::str(layout.version()));

    let crawl = new_node(&mut tree, CRAWL_CONFIG);
    set(&mut tree, crawl, "mMaxThreads", Value::Int(5));
    set(&mut tree, crawl, "mLimitSearchTotal", Value::Bool(true));
    set(&mut tree, crawl, "mSearchTotalLimit", Value::Int(500));
    set(&mut tree, crawl, "mLimitSearchDepth", Value::Bool(false));
    set(&mut tree, crawl, "mSearchDepthLimit", Value::Int(10));
    match layout {
        Layout::Current => set(
            &mut tree,
            crawl,
            "mRenderingMode",
            Value::enum_member(RENDERING_MODE, "HTML"),
        ),
        Layout::Legacy => set(
            &mut tree,
            crawl,
            "mCrawlerMode",
            Value::enum_member(CRAWLER_MODE, "STANDARD"),
        ),
    }
    set(&mut tree, crawl, "mRobotsTxtMode", Value::enum_member(ROBOTS_MODE, "RESPECT"));
    set(&mut tree, crawl, "mRespectCanonical", Value::Bool(true));
    set(&mut tree, crawl, "mCrawlCSS", Value::Bool(true));
    set(&mut tree, crawl, "mIncludePatterns", Value::List(vec![Value::str("/blog/.*")]));
    set(&mut tree, crawl, "mParent", Value::Object(root));
    set(&mut tree, root, "mCrawlConfig", Value::Object(crawl));

    let ua = new_node(&mut tree, USER_AGENT_CONFIG);
    set(&mut tree, ua, "mUserAgent", Value::str("Screaming Frog SEO Spider"));
    set(&mut tree, ua, "mPreset", Value::enum_member(UA_PRESET, "SCREAMING_FROG"));
    set(&mut tree, root, "mUserAgentConfig", Value::Object(ua));

    let exclude = new_node(&mut tree, EXCLUDE_MANAGER);
    set(&mut tree, exclude, "mRawExcludeListString", Value::str("*.jpg"));
    set(&mut tree, root, layout.exclude_attr(), Value::Object(exclude));

    let proxy = new_node(&mut tree, PROXY_CONFIG);
    set(&mut tree, proxy, "mHost", Value::str("proxy.local"));
    set(&mut tree, proxy, "mPort", Value::Int(8080));
    set(&mut tree, proxy, "mPassword", Value::str("hunter2"));
    set(&mut tree, root, "mProxyConfig", Value::Object(proxy));

    let locale = new_node(&mut tree, LOCALE);
    set(&mut tree, locale, "language", Value::str("en"));
    set(&mut tree, root, "mLocale", Value::Object(locale));

    set(
        &mut tree,
        root,
        "mExtraHeaders",
        Value::Map(vec![("X-Env".into(), Value::str("staging"))]),
    );

    let extraction = new_node(&mut tree, EXTRACTION_CONFIG);
    let price = extraction_rule(&mut tree, "Price", "CSSPATH", "INNER_TEXT", ".price");
    set(&mut tree, extraction, "mFilters", Value::List(vec![Value::Object(price)]));
    set(&mut tree, root, "mCustomExtractionConfig", Value::Object(extraction));

    let search = new_node(&mut tree, SEARCH_CONFIG);
    set(&mut tree, search, "mSearches", Value::List(Vec::new()));
    set(&mut tree, root, "mCustomSearchConfig", Value::Object(search));

    let js = new_node(&mut tree, JS_CONFIG);
    set(&mut tree, js, "mJsSnippets", Value::List(Vec::new()));
    set(&mut tree, root, "mCustomJavaScriptConfig", Value::Object(js));

    tree
}

/// Allocate a physical extraction rule.
pub fn extraction_rule(
    tree: &mut ConfigTree,
    name: &str,
    extraction_type: &str,
    data_type: &str,
    expression: &str,
) -> NodeId {
    let rule = new_node(tree, EXTRACTION_INFO);
    set(tree, rule, "mName", Value::str(name));
    set(tree, rule, "mExtractionType", Value::enum_member(EXTRACTION_TYPE, extraction_type));
    set(tree, rule, "mDataType", Value::enum_member(EXTRACTION_DATA_TYPE, data_type));
    set(tree, rule, "mExpression", Value::str(expression));
    set(tree, rule, "mAttribute", Value::str(""));
    rule
}
