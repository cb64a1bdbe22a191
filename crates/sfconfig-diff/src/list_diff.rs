//! Set comparison of two list fields.
//!
//! Items compare by exact text. Order is ignored and duplicates collapse,
//! so a pure reordering is not a difference.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Items added, removed and kept between two lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDelta {
    /// In B but not in A, in B's order.
    pub added: Vec<String>,
    /// In A but not in B, in A's order.
    pub removed: Vec<String>,
    /// In both, in A's order.
    pub unchanged: Vec<String>,
}

impl ListDelta {
    /// True when the two lists hold the same distinct items.
    pub fn is_same(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare list A against list B.
pub fn diff_lists(a: &[String], b: &[String]) -> ListDelta {
    let set_a: IndexSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: IndexSet<&str> = b.iter().map(String::as_str).collect();

    ListDelta {
        added: pick(&set_b, &set_a, false),
        removed: pick(&set_a, &set_b, false),
        unchanged: pick(&set_a, &set_b, true),
    }
}

/// Items of `from` whose membership in `other` equals `present`.
fn pick(from: &IndexSet<&str>, other: &IndexSet<&str>, present: bool) -> Vec<String> {
    from.iter()
        .filter(|item| other.contains(**item) == present)
        .map(|item| item.to_string())
        .collect()
}
