//! Crawl limits derived from an "is limited" flag plus a numeric cap.
//!
//! The logical value is the cap when the flag is set and 0 (unlimited)
//! otherwise.

use sfconfig_types::{ConfigTree, NodeId, Value};

use crate::error::{SchemaError, SchemaResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrawlLimit {
    MaxUrls,
    MaxDepth,
}

impl CrawlLimit {
    pub const ALL: [CrawlLimit; 2] = [CrawlLimit::MaxUrls, CrawlLimit::MaxDepth];

    /// Logical attribute name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MaxUrls => "mMaxUrls",
            Self::MaxDepth => "mMaxDepth",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::MaxUrls => "mCrawlConfig.mMaxUrls",
            Self::MaxDepth => "mCrawlConfig.mMaxDepth",
        }
    }

    /// Flag and cap attributes on the crawl settings object.
    pub fn backing_attrs(self) -> [&'static str; 2] {
        [self.flag_attr(), self.cap_attr()]
    }

    fn flag_attr(self) -> &'static str {
        match self {
            Self::MaxUrls => "mLimitSearchTotal",
            Self::MaxDepth => "mLimitSearchDepth",
        }
    }

    fn cap_attr(self) -> &'static str {
        match self {
            Self::MaxUrls => "mSearchTotalLimit",
            Self::MaxDepth => "mSearchDepthLimit",
        }
    }

    fn physical<'t>(self, tree: &'t ConfigTree, crawl: NodeId) -> Option<(bool, &'t Value)> {
        let flag = tree.attr(crawl, self.flag_attr())?.as_bool()?;
        let cap = tree.attr(crawl, self.cap_attr())?;
        cap.is_numeric().then_some((flag, cap))
    }

    /// Logical value, or `None` when the flag is not a boolean or the cap
    /// is not numeric.
    pub fn read(self, tree: &ConfigTree, crawl: NodeId) -> Option<i64> {
        let (limited, cap) = self.physical(tree, crawl)?;
        if !limited {
            return Some(0);
        }
        cap.as_i64()
    }

    /// Write the flag (`value != 0`) and the cap, keeping the cap's stored
    /// width.
    pub fn write(self, tree: &mut ConfigTree, crawl: NodeId, value: i32) -> SchemaResult<()> {
        let cap = match self.physical(tree, crawl) {
            Some((_, cap)) => same_width(cap, value)
                .ok_or_else(|| SchemaError::validation(format!("Invalid int for: {}", self.path())))?,
            None => return Err(SchemaError::unsupported(self.name())),
        };
        tree.set_attr(crawl, self.flag_attr(), Value::Bool(value != 0))?;
        tree.set_attr(crawl, self.cap_attr(), cap)?;
        Ok(())
    }
}

fn same_width(existing: &Value, value: i32) -> Option<Value> {
    Some(match existing {
        Value::Byte(_) => Value::Byte(i8::try_from(value).ok()?),
        Value::Short(_) => Value::Short(i16::try_from(value).ok()?),
        Value::Long(_) => Value::Long(i64::from(value)),
        Value::Float(_) => Value::Float(value as f32),
        Value::Double(_) => Value::Double(f64::from(value)),
        Value::Number(_) => Value::Number(f64::from(value)),
        _ => Value::Int(value),
    })
}
