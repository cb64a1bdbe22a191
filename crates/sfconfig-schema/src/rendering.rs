//! Rendering mode over a direct attribute or the legacy crawler mode.
//!
//! Legacy trees carry a tri-valued `mCrawlerMode` (`STANDARD`, `RENDER`,
//! `AJAX`); the logical domain is `HTML` / `JAVASCRIPT`.

use sfconfig_types::{AttrType, ConfigTree, NodeId, Value};

use crate::error::{SchemaError, SchemaResult};

pub const PATH: &str = "mCrawlConfig.mRenderingMode";
pub const DIRECT_ATTR: &str = "mRenderingMode";
pub const LEGACY_ATTR: &str = "mCrawlerMode";

/// Logical enum options.
pub const MODES: [&str; 2] = ["HTML", "JAVASCRIPT"];

/// Read mapping; unrecognised legacy members pass through.
pub fn legacy_to_logical(member: &str) -> &str {
    match member {
        "STANDARD" => "HTML",
        "RENDER" | "AJAX" => "JAVASCRIPT",
        other => other,
    }
}

/// Write mapping; legacy member names are accepted as-is.
pub fn logical_to_legacy(mode: &str) -> SchemaResult<String> {
    let upper = mode.to_uppercase();
    match upper.as_str() {
        "HTML" => Ok("STANDARD".to_string()),
        "JAVASCRIPT" => Ok("RENDER".to_string()),
        "STANDARD" | "RENDER" | "AJAX" => Ok(upper),
        _ => Err(SchemaError::InvalidRenderingMode(mode.to_string())),
    }
}

/// True when only the legacy representation exists.
pub fn uses_legacy(tree: &ConfigTree, crawl: NodeId) -> bool {
    !tree.has_attr(crawl, DIRECT_ATTR) && tree.has_attr(crawl, LEGACY_ATTR)
}

/// Logical rendering mode; `None` if neither attribute is declared or the
/// declared one is null.
pub fn read(tree: &ConfigTree, crawl: NodeId) -> Option<String> {
    if tree.has_attr(crawl, DIRECT_ATTR) {
        return tree.attr(crawl, DIRECT_ATTR).and_then(Value::display_text);
    }
    let legacy = tree.attr(crawl, LEGACY_ATTR)?.display_text()?;
    Some(legacy_to_logical(&legacy).to_string())
}

/// Write a logical (or legacy) mode into whichever attribute exists.
pub fn write(tree: &mut ConfigTree, crawl: NodeId, mode: &str) -> SchemaResult<()> {
    let (attr, member) = if tree.has_attr(crawl, DIRECT_ATTR) {
        (DIRECT_ATTR, mode.to_uppercase())
    } else if tree.has_attr(crawl, LEGACY_ATTR) {
        (LEGACY_ATTR, logical_to_legacy(mode)?)
    } else {
        return Err(SchemaError::unsupported(DIRECT_ATTR));
    };

    let value = match tree.attr_type(crawl, attr) {
        Some(AttrType::Enum(enum_name)) => {
            let def = tree
                .registry()
                .enum_def(enum_name)
                .filter(|def| def.contains(&member))
                .ok_or_else(|| SchemaError::InvalidRenderingMode(mode.to_string()))?;
            Value::enum_member(def.name.clone(), member)
        }
        _ => return Err(SchemaError::InvalidRenderingMode(mode.to_string())),
    };
    tree.set_attr(crawl, attr, value)?;
    Ok(())
}
