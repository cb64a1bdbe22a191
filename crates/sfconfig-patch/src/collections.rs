//! Rule collection ops: `add`, `remove`, `clear`, applied in order.

use serde_json::Value as Json;
use sfconfig_schema::rules::json_string;
use sfconfig_schema::{RuleKind, RuleList};
use sfconfig_types::ConfigTree;
use tracing::warn;

use crate::error::{PatchError, PatchResult};

/// Apply a collection's op array to an opened rule list.
///
/// Removing a rule that does not exist is not an error; a warning is
/// pushed instead.
pub fn apply_rule_ops(
    list: &mut RuleList,
    tree: &mut ConfigTree,
    ops: &[Json],
    warnings: &mut Vec<String>,
) -> PatchResult<()> {
    let kind = list.kind();
    for entry in ops {
        let Json::Object(fields) = entry else {
            return Err(PatchError::validation(format!("Invalid {} op entry", kind.noun())));
        };
        let op = json_string(fields, "op").ok_or_else(|| {
            PatchError::validation(format!("{} op missing 'op'", kind.label()))
        })?;

        match op.to_ascii_lowercase().as_str() {
            "clear" => list.clear(),
            "remove" => {
                let name = json_string(fields, "name").ok_or_else(|| {
                    PatchError::validation(format!("{} remove requires name", kind.label()))
                })?;
                if !list.remove(tree, &name) {
                    warn!(kind = kind.key(), rule = %name, "rule not found for removal");
                    warnings.push(not_found(kind, &name));
                }
            }
            "add" => list.add(tree, fields)?,
            _ => {
                return Err(PatchError::validation(format!(
                    "Unsupported {} op: {op}",
                    kind.noun()
                )))
            }
        }
    }
    Ok(())
}

fn not_found(kind: RuleKind, name: &str) -> String {
    format!("{} not found for removal: {name}", kind.label())
}
