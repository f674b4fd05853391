//! Key-casing conversion between the in-memory (camelCase) and wire
//! (snake_case) conventions.
//!
//! Both directions walk objects and arrays recursively. Values under a
//! `required` key are field names rather than data, so their strings are
//! converted exactly like object keys.

use serde_json::{Map, Value};

const REQUIRED_KEY: &str = "required";

/// `sampleHertz` → `sample_hertz`
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `sample_hertz` → `sampleHertz`
///
/// Only an inner underscore followed by a lowercase letter is folded, so keys
/// such as `_private` or `v_2` pass through unchanged.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' && !out.is_empty() {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Convert an outbound payload to wire keys
pub fn to_wire_keys(value: Value) -> Value {
    convert_keys(value, to_snake_case)
}

/// Convert an inbound payload from wire keys
pub fn from_wire_keys(value: Value) -> Value {
    convert_keys(value, to_camel_case)
}

fn convert_keys(value: Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        Value::Object(map) => {
            let mut converted = Map::new();
            for (key, value) in map {
                let key = convert(&key);
                let value = match value {
                    Value::Array(names) if key == REQUIRED_KEY => {
                        Value::Array(names.into_iter().map(|n| convert_name(n, convert)).collect())
                    }
                    other => convert_keys(other, convert),
                };
                converted.insert(key, value);
            }
            Value::Object(converted)
        }
        other => other,
    }
}

fn convert_name(name: Value, convert: fn(&str) -> String) -> Value {
    match name {
        Value::String(s) => Value::String(convert(&s)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_non_string_entries_untouched() {
        let value = json!({"required": ["partySize", 3, null]});
        assert_eq!(to_wire_keys(value), json!({"required": ["party_size", 3, null]}));
    }

    #[test]
    fn test_required_outside_array_is_regular_value() {
        let value = json!({"required": {"innerKey": true}});
        assert_eq!(to_wire_keys(value), json!({"required": {"inner_key": true}}));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(from_wire_keys(json!("some_text")), json!("some_text"));
        assert_eq!(from_wire_keys(json!([1, "a_b"])), json!([1, "a_b"]));
    }
}
