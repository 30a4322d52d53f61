use std::collections::HashMap;

use md5::{Digest, Md5};
use serde_json::Value;

const SENSITIVE_KEY_SUBSTRINGS: &[&str] =
    &["key", "secret", "password", "token", "passphrase", "credential"];

/// Recursively flattens a JSON object into `key/nested/key` paths with
/// stringified scalar values, then redacts any key matching a sensitive
/// substring. Array elements are indexed into the path (`items/0`).
pub fn flatten_and_sanitize(value: &Value) -> HashMap<String, String> {
    let mut flat = HashMap::new();
    flatten_into(value, String::new(), &mut flat);

    for (key, val) in flat.iter_mut() {
        if is_sensitive_key(key) {
            *val = obfuscated_value(val);
        }
    }
    flat
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_SUBSTRINGS
        .iter()
        .any(|needle| lower.contains(needle))
}

fn obfuscated_value(original: &str) -> String {
    let digest = Md5::digest(original.as_bytes());
    format!("Secret obfuscated - md5 hash: {}", hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String cannot fail");
    }
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = join_path(&prefix, key);
                flatten_into(val, path, out);
            }
        }
        Value::Array(items) => {
            for (idx, val) in items.iter().enumerate() {
                let path = join_path(&prefix, &idx.to_string());
                flatten_into(val, path, out);
            }
        }
        Value::Null => {
            out.insert(prefix, String::new());
        }
        Value::Bool(b) => {
            out.insert(prefix, b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix, n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}/{segment}")
    }
}
