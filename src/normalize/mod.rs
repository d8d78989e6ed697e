pub mod identity;
pub mod numeric;
pub mod phone;

use serde_json::Value;

/// Cell text of a JSON scalar. Metadata blobs sometimes carry numbers where
/// strings are expected (e.g. a phone number without quotes); those are
/// stringified rather than discarded. Nested structures yield `""`.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
