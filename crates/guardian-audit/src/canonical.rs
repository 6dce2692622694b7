//! Canonical JSON encoding.
//!
//! The hash of an event must not depend on the order in which its object
//! keys happen to be stored or serialized.  `canonical_json` produces one
//! byte string per semantic value:
//!
//! - objects: keys sorted by their UTF-8 bytes, `key:value` pairs joined by
//!   `,`, wrapped in `{}`
//! - arrays: elements in given order, joined by `,`, wrapped in `[]`
//! - scalars: standard JSON text (strings escaped as `serde_json` does)
//!
//! No whitespace is emitted anywhere.

use serde_json::Value;

/// Encode `value` canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// `canonical_json` as bytes, ready for a hasher.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    canonical_json(value).into_bytes()
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // null, booleans and numbers: their Display is their JSON text.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::from(s).to_string());
}
