//! Success envelope handling.
//!
//! Successful responses arrive as `{ "success": true, "data": ..., "timestamp": ... }`.

use serde_json::Value;

/// Replace an envelope with its `data` payload; anything else passes through.
///
/// Total: any JSON value is accepted. Only an object whose `success` is
/// literally `true` and which has a `data` key (even `null`) is unwrapped.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if map.get("success") == Some(&Value::Bool(true)) && map.contains_key("data") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
