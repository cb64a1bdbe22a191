//! Edits to scalar list fields.
//!
//! A list edit is either a bare array (replace wholesale) or an object
//! `{"op": ..., "values": [...]}`. Op names are case-insensitive.

use serde_json::Value as Json;

use crate::coerce::scalar_text;
use crate::error::{PatchError, PatchResult};

/// A parsed list edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListPatch {
    Set(Vec<String>),
    Append(Vec<String>),
    Prepend(Vec<String>),
    /// Delete every occurrence of each value.
    Remove(Vec<String>),
    Clear,
}

impl ListPatch {
    pub fn parse(input: &Json) -> PatchResult<Self> {
        let op_obj = match input {
            Json::Null => return Err(PatchError::validation("List patch cannot be null")),
            Json::Array(items) => return Ok(Self::Set(list_values(items)?)),
            Json::Object(obj) => obj,
            _ => return Err(PatchError::validation("Invalid list patch format")),
        };

        let op = op_obj
            .get("op")
            .and_then(scalar_text)
            .ok_or_else(|| PatchError::validation("List patch missing op"))?;
        let op_lower = op.to_ascii_lowercase();
        let values = op_obj.get("values").and_then(Json::as_array);

        match op_lower.as_str() {
            "clear" => return Ok(Self::Clear),
            "set" => {
                let values = values.ok_or_else(|| {
                    PatchError::validation("List patch set requires values array")
                })?;
                return Ok(Self::Set(list_values(values)?));
            }
            _ => {}
        }

        let values = values
            .ok_or_else(|| PatchError::validation("List patch requires values array"))?;
        let values = list_values(values)?;
        match op_lower.as_str() {
            "append" => Ok(Self::Append(values)),
            "prepend" => Ok(Self::Prepend(values)),
            "remove" => Ok(Self::Remove(values)),
            _ => Err(PatchError::validation(format!("Unsupported list patch op: {op}"))),
        }
    }

    /// Apply to the current items. Items that are not plain text (nulls in
    /// a physical list) survive every op except `set`, `clear` and a
    /// matching `remove`.
    pub fn apply<T>(&self, before: Vec<T>) -> Vec<T>
    where
        T: From<String> + PartialEq,
    {
        let convert = |values: &[String]| values.iter().cloned().map(T::from).collect::<Vec<T>>();
        match self {
            Self::Set(values) => convert(values),
            Self::Clear => Vec::new(),
            Self::Append(values) => {
                let mut out = before;
                out.extend(convert(values));
                out
            }
            Self::Prepend(values) => {
                let mut out = convert(values);
                out.extend(before);
                out
            }
            Self::Remove(values) => {
                let doomed = convert(values);
                before.into_iter().filter(|item| !doomed.contains(item)).collect()
            }
        }
    }
}

fn list_values(items: &[Json]) -> PatchResult<Vec<String>> {
    items
        .iter()
        .map(|item| {
            scalar_text(item).ok_or_else(|| PatchError::validation("List values must be primitives"))
        })
        .collect()
}
