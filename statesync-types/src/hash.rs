//! Canonical encoding and SHA-256 helpers.
//!
//! The canonical form is compact JSON with object keys sorted
//! lexicographically at every nesting level. It does not depend on the
//! map implementation `serde_json` was compiled with, so two values with the
//! same content always encode to the same bytes.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Length of the hash prefix carried by platform-tagged sync hashes.
const SYNC_HASH_PREFIX_LEN: usize = 16;

/// Computes the lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Encodes a JSON value in canonical form.
pub fn canonical_json(value: &Value) -> String {
    let mut output = String::new();
    emit_value(value, &mut output);
    output
}

/// Hashes the canonical encoding of a JSON value.
pub fn hash_value(value: &Value) -> String {
    sha256_hex(canonical_json(value))
}

/// Creates a platform-tagged hash for cross-platform state tracking.
///
/// The result is `"<platform>:<first 16 hex chars of the content hash>"`.
pub fn hash_for_sync(data: &Value, platform: &str) -> String {
    let full = hash_value(data);
    format!("{platform}:{}", &full[..SYNC_HASH_PREFIX_LEN])
}

/// Checks a platform-tagged hash produced by [`hash_for_sync`].
///
/// Values without a platform prefix never verify.
pub fn verify_sync_hash(data: &Value, expected: &str) -> bool {
    match expected.split_once(':') {
        Some((platform, _)) => hash_for_sync(data, platform) == expected,
        None => false,
    }
}

fn emit_value(value: &Value, output: &mut String) {
    match value {
        Value::Null => output.push_str("null"),
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(output, "{n}");
        }
        Value::String(s) => emit_string(s, output),
        Value::Array(items) => {
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                emit_value(item, output);
            }
            output.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            output.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                emit_string(key, output);
                output.push(':');
                emit_value(&map[key], output);
            }
            output.push('}');
        }
    }
}

fn emit_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn canonical_sorts_nested_keys() {
        let value = json!({"b": {"z": 1, "a": [true, null]}, "a": "x"});
        assert_eq!(canonical_json(&value), r#"{"a":"x","b":{"a":[true,null],"z":1}}"#);
    }

    #[test]
    fn canonical_escapes_control_characters() {
        let value = json!("a\"b\\c\n\u{0001}");
        assert_eq!(canonical_json(&value), r#""a\"b\\c\n\u0001""#);
    }

    #[test]
    fn sync_hash_has_platform_prefix() {
        let data = json!({"title": "Test Card"});
        let tagged = hash_for_sync(&data, "github");
        assert!(tagged.starts_with("github:"));
        assert_eq!(tagged.len(), "github:".len() + SYNC_HASH_PREFIX_LEN);
        assert!(verify_sync_hash(&data, &tagged));
    }

    #[test]
    fn sync_hash_rejects_untagged_or_altered() {
        let data = json!({"title": "Test Card"});
        let tagged = hash_for_sync(&data, "local");
        assert!(!verify_sync_hash(&data, tagged.trim_start_matches("local:")));
        assert!(!verify_sync_hash(&json!({"title": "Other"}), &tagged));
    }
}
