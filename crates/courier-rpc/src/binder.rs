//! Parameter binder — flattens a named-parameter object into string pairs.

use serde_json::Value;

use crate::errors::BindError;

/// Bound parameters ready for the routed request's string-only carrier.
pub type BoundParams = Vec<(String, String)>;

/// Bind a `params` payload into `(key, value)` string pairs.
///
/// Only named parameters (a JSON object) are supported; anything else is
/// rejected with [`BindError::UnsupportedShape`]. Per entry:
///
/// - `null` values are skipped entirely, never forwarded;
/// - strings pass through as-is, numbers and booleans via their plain
///   string form;
/// - nested objects and arrays are forwarded as their compact serialized
///   JSON text, so the string-only carrier can hold complex arguments
///   opaquely and the downstream handler re-parses them.
pub fn bind(params: &Value) -> Result<BoundParams, BindError> {
    let Value::Object(entries) = params else {
        return Err(BindError::UnsupportedShape {
            shape: shape_of(params),
        });
    };

    let mut bound = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match value {
            Value::Null => {}
            Value::String(text) => bound.push((key.clone(), text.clone())),
            Value::Number(n) => bound.push((key.clone(), n.to_string())),
            Value::Bool(b) => bound.push((key.clone(), b.to_string())),
            structured => bound.push((key.clone(), structured.to_string())),
        }
    }
    Ok(bound)
}

/// Human-readable JSON shape name for diagnostics.
fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
