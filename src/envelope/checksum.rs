//! Snapshot checksums.
//!
//! The checksum is SHA-256 over a canonical JSON rendering of
//! `{"metadata": …, "tabs": …}`: object keys sorted at every depth, no
//! whitespace. Typed snapshots and raw JSON snapshots go through the same
//! canonical form, so a snapshot built here verifies after a trip through
//! any JSON encoder that preserves values.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::schema::{SnapshotMetadata, TabRecord};

// ============================================================================
// Canonical JSON
// ============================================================================

/// Renders a JSON value with recursively sorted object keys.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
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

// ============================================================================
// Checksums
// ============================================================================

/// Computes the checksum over raw `tabs` and `metadata` values.
#[must_use]
pub fn checksum_of(tabs: &Value, metadata: &Value) -> String {
    let mut payload = String::from("{\"metadata\":");
    write_canonical(metadata, &mut payload);
    payload.push_str(",\"tabs\":");
    write_canonical(tabs, &mut payload);
    payload.push('}');

    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Computes the checksum over typed tabs and metadata.
///
/// # Errors
///
/// Returns [`Error::Json`] if the values cannot be encoded.
pub fn compute_checksum(tabs: &[TabRecord], metadata: &SnapshotMetadata) -> Result<String> {
    let tabs = serde_json::to_value(tabs)?;
    let metadata = serde_json::to_value(metadata)?;
    Ok(checksum_of(&tabs, &metadata))
}

/// Verifies the checksum of a raw snapshot, if it carries one.
///
/// Snapshots without a checksum pass. A checksum of the wrong type can
/// never match and is reported as a mismatch.
///
/// # Errors
///
/// Returns [`Error::ChecksumMismatch`] if the carried checksum differs
/// from the one recomputed over the snapshot's own tabs and metadata.
pub fn verify_checksum(snapshot: &Value) -> Result<()> {
    let Some(carried) = snapshot.get("checksum").filter(|v| !v.is_null()) else {
        return Ok(());
    };

    let tabs = snapshot.get("tabs").unwrap_or(&Value::Null);
    let metadata = snapshot.get("metadata").unwrap_or(&Value::Null);
    let actual = checksum_of(tabs, metadata);

    match carried.as_str() {
        Some(expected) if expected == actual => Ok(()),
        Some(expected) => Err(Error::checksum_mismatch(expected, actual)),
        None => Err(Error::checksum_mismatch(carried.to_string(), actual)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({ "b": 1, "a": { "d": [true, null], "c": "x" } });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":"x","d":[true,null]},"b":1}"#
        );
    }

    #[test]
    fn test_canonical_json_escapes_keys_and_strings() {
        let value = json!({ "quote\"key": "line\nbreak" });
        assert_eq!(canonical_json(&value), r#"{"quote\"key":"line\nbreak"}"#);
    }

    #[test]
    fn test_checksum_is_stable() {
        let tabs = json!([{ "url": "https://a.com", "id": "1" }]);
        let metadata = json!({ "deviceId": "d" });
        assert_eq!(checksum_of(&tabs, &metadata), checksum_of(&tabs, &metadata));
        assert_eq!(checksum_of(&tabs, &metadata).len(), 64);
    }

    #[test]
    fn test_checksum_ignores_key_order() {
        let a = json!([{ "url": "https://a.com", "id": "1" }]);
        let b: Value = serde_json::from_str(r#"[{"id":"1","url":"https://a.com"}]"#).unwrap();
        let metadata = json!({});
        assert_eq!(checksum_of(&a, &metadata), checksum_of(&b, &metadata));
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let metadata = json!({ "deviceId": "d" });
        let a = checksum_of(&json!([{ "url": "https://a.com" }]), &metadata);
        let b = checksum_of(&json!([{ "url": "https://b.com" }]), &metadata);
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_without_checksum_passes() {
        assert!(verify_checksum(&json!({ "tabs": [], "metadata": {} })).is_ok());
        assert!(verify_checksum(&json!({ "tabs": [], "metadata": {}, "checksum": null })).is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let tabs = json!([{ "url": "https://a.com" }]);
        let metadata = json!({ "deviceId": "d" });
        let checksum = checksum_of(&tabs, &metadata);

        let mut snapshot = json!({ "tabs": tabs, "metadata": metadata, "checksum": checksum });
        assert!(verify_checksum(&snapshot).is_ok());

        snapshot["tabs"][0]["url"] = json!("https://evil.com");
        let err = verify_checksum(&snapshot).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_verify_non_string_checksum_mismatches() {
        let snapshot = json!({ "tabs": [], "metadata": {}, "checksum": 7 });
        assert!(matches!(
            verify_checksum(&snapshot),
            Err(Error::ChecksumMismatch { .. })
        ));
    }
}
