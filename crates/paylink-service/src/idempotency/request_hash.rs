//! Order-independent request fingerprints.

use paylink_core::PaylinkResult;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of `payload` in canonical JSON form.
///
/// Object keys are sorted recursively (byte order) before serialising, so two
/// payloads that differ only in field order hash identically. Array order is
/// significant.
pub fn create_request_hash<T: Serialize + ?Sized>(payload: &T) -> PaylinkResult<String> {
    let value = serde_json::to_value(payload)?;
    Ok(hash_value(&value))
}

/// Hex SHA-256 of an already-built JSON value.
#[must_use]
pub fn hash_value(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, entry)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(entry, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
