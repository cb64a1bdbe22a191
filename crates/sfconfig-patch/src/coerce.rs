//! Conversion of patch input into a slot's native representation.

use serde_json::Value as Json;
use sfconfig_types::{AttrType, Primitive, TypeRegistry, Value};

use crate::error::{PatchError, PatchResult};

/// Coerce `input` for a slot declared as `target` at `path`.
///
/// Null is accepted for every non-primitive slot. Integer widths are range
/// checked. Enum input matches member names case-insensitively and stores
/// the canonical spelling.
pub fn coerce(registry: &TypeRegistry, target: &AttrType, input: &Json, path: &str) -> PatchResult<Value> {
    if input.is_null() {
        if target.is_primitive() {
            return Err(PatchError::validation(format!(
                "Null not allowed for primitive: {path}"
            )));
        }
        return Ok(Value::Null);
    }

    match target {
        AttrType::Prim(prim) | AttrType::Boxed(prim) => coerce_primitive(*prim, input, path),
        AttrType::Str => scalar_text(input)
            .map(Value::Str)
            .ok_or_else(|| invalid("string", path)),
        AttrType::Enum(name) => {
            let raw = scalar_text(input).ok_or_else(|| invalid("enum", path))?;
            let member = registry
                .enum_def(name)
                .and_then(|def| def.find_member(&raw))
                .ok_or_else(|| {
                    PatchError::validation(format!("Invalid enum value for {path}: {raw}"))
                })?;
            Ok(Value::enum_member(name.clone(), member))
        }
        other => Err(unsupported(declared_name(other))),
    }
}

fn coerce_primitive(prim: Primitive, input: &Json, path: &str) -> PatchResult<Value> {
    match prim {
        Primitive::Bool => json_bool(input)
            .map(Value::Bool)
            .ok_or_else(|| invalid("boolean", path)),
        Primitive::Byte => json_integer(input)
            .and_then(|v| i8::try_from(v).ok())
            .map(Value::Byte)
            .ok_or_else(|| invalid("int", path)),
        Primitive::Short => json_integer(input)
            .and_then(|v| i16::try_from(v).ok())
            .map(Value::Short)
            .ok_or_else(|| invalid("int", path)),
        Primitive::Int => json_integer(input)
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int)
            .ok_or_else(|| invalid("int", path)),
        Primitive::Long => json_integer(input)
            .map(Value::Long)
            .ok_or_else(|| invalid("long", path)),
        Primitive::Double => json_float(input)
            .map(Value::Double)
            .ok_or_else(|| invalid("double", path)),
        Primitive::Float => json_float(input)
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .map(Value::Float)
            .ok_or_else(|| invalid("float", path)),
        Primitive::Char => Err(unsupported("char")),
    }
}

fn invalid(what: &str, path: &str) -> PatchError {
    PatchError::validation(format!("Invalid {what} for: {path}"))
}

fn unsupported(type_name: &str) -> PatchError {
    PatchError::validation(format!("Unsupported field type: {type_name}"))
}

fn declared_name(ty: &AttrType) -> &str {
    match ty {
        AttrType::Number => "number",
        AttrType::List => "list",
        AttrType::Map => "map",
        AttrType::Object(name) | AttrType::Enum(name) => name,
        AttrType::Str => "string",
        AttrType::Prim(_) | AttrType::Boxed(_) => "primitive",
    }
}

/// Text of a JSON scalar; arrays and objects have none.
pub(crate) fn scalar_text(input: &Json) -> Option<String> {
    match input {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

fn json_integer(input: &Json) -> Option<i64> {
    match input {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_float(input: &Json) -> Option<f64> {
    let value = match input {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn json_bool(input: &Json) -> Option<bool> {
    match input {
        Json::Bool(b) => Some(*b),
        Json::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Json::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
