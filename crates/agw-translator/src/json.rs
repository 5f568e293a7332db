//! JSON key normalization.
//!
//! The descriptor's `logging`/`logs` sections arrive with camelCase keys
//! but are embedded into the service-control filter with the original
//! proto (snake_case) names. This module rewrites keys recursively.

use serde_json::Value;

/// Rewrite every object key from camelCase to snake_case, recursively.
/// Keys without upper-case letters (including `@type`) pass through.
#[must_use]
pub fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (camel_to_snake(&k), snake_case_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_case_keys).collect()),
        other => other,
    }
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_nested_keys() {
        let input = json!({
            "producerDestinations": [
                {"logs": ["endpoints_log"], "monitoredResource": "api"}
            ]
        });
        let want = json!({
            "producer_destinations": [
                {"logs": ["endpoints_log"], "monitored_resource": "api"}
            ]
        });
        assert_eq!(snake_case_keys(input), want);
    }

    #[test]
    fn leaves_snake_case_and_type_markers_alone() {
        let input = json!({"@type": "type.googleapis.com/google.api.Service", "name": "x"});
        assert_eq!(snake_case_keys(input.clone()), input);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(snake_case_keys(json!(42)), json!(42));
    }
}
