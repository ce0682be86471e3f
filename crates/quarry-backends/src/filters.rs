//! Metadata equality filters shared by the local adapters.

use std::collections::BTreeMap;

use quarry_core::models::Metadata;

/// True when every filter key is present in `metadata` with an equal value.
///
/// Strings compare exactly; other JSON values compare by their rendered
/// form; arrays match when any element matches.
pub fn matches(metadata: &Metadata, filters: &BTreeMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| {
        metadata
            .get(key)
            .is_some_and(|value| value_matches(value, expected))
    })
}

fn value_matches(value: &serde_json::Value, expected: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s == expected,
        serde_json::Value::Array(items) => items.iter().any(|v| value_matches(v, expected)),
        serde_json::Value::Null => false,
        other => other.to_string() == expected,
    }
}
