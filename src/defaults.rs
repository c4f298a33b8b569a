//! Recursive defaulting for settings documents
//!
//! Fills gaps in a partial JSON document from a complete one: objects are
//! walked recursively, everything else is atomic, and a present non-null
//! value always beats its default.

use serde_json::Value;

/// Return `value` with every hole filled from `defaults`.
///
/// For each key in `defaults`: when both sides hold objects the fill
/// recurses, when `value` has no entry or an explicit null the default is
/// taken, otherwise the existing value stands. Arrays are taken wholesale.
/// Keys only `value` knows are kept. Neither input is mutated.
pub fn apply_defaults(value: &Value, defaults: &Value) -> Value {
    match (value, defaults) {
        (Value::Object(have), Value::Object(want)) => {
            let mut out = have.clone();
            for (key, default) in want {
                let filled = match have.get(key) {
                    Some(existing @ Value::Object(_)) if default.is_object() => {
                        apply_defaults(existing, default)
                    }
                    Some(Value::Null) | None => default.clone(),
                    Some(existing) => existing.clone(),
                };
                out.insert(key.clone(), filled);
            }
            Value::Object(out)
        }
        (Value::Null, defaults) => defaults.clone(),
        (value, _) => value.clone(),
    }
}
