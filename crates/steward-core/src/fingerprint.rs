// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical JSON encoding and SHA-256 fingerprints.
//!
//! The byte form matters: these strings feed SHA-256 (spec fingerprints) and
//! HMAC-SHA-256 (approval tokens), so both producers must agree exactly.

use crate::ContractError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialize a value to its canonical JSON form.
///
/// Canonical means UTF-8, object keys sorted in code-point order, `,` and `:`
/// separators with no spaces, and no trailing newline. Key ordering comes from
/// routing through [`serde_json::Value`], whose object map is a `BTreeMap`.
///
/// # Errors
///
/// Returns [`ContractError::Json`] if the value cannot be serialized.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let v = json!({"b": 1, "a": {"z": true, "y": null}});
/// assert_eq!(
///     steward_core::canonical_json(&v).unwrap(),
///     r#"{"a":{"y":null,"z":true},"b":1}"#
/// );
/// ```
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, ContractError> {
    let v = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&v)?)
}

/// Hex-encoded SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hex-encoded SHA-256 of the canonical JSON form of `value`.
///
/// This is the `spec_hash` every queue item carries and every approval token
/// binds.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, ContractError> {
    let json = canonical_json(value)?;
    Ok(sha256_hex(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        zebra: &'static str,
        alpha: u32,
    }

    #[test]
    fn keys_are_sorted_regardless_of_field_order() {
        let s = Sample {
            zebra: "z",
            alpha: 1,
        };
        assert_eq!(canonical_json(&s).unwrap(), r#"{"alpha":1,"zebra":"z"}"#);
    }

    #[test]
    fn no_spaces_in_separators() {
        let v = json!({"a": [1, 2], "b": {"c": "d"}});
        let out = canonical_json(&v).unwrap();
        assert!(!out.contains(": "));
        assert!(!out.contains(", "));
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let h = fingerprint(&json!({"qid": "x"})).unwrap();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let v = json!({"b": 2, "a": 1});
        assert_eq!(fingerprint(&v).unwrap(), fingerprint(&v).unwrap());
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let a = fingerprint(&json!({"to": "me@example.com"})).unwrap();
        let b = fingerprint(&json!({"to": "other@example.com"})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn sha256_hex_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    proptest::proptest! {
        #[test]
        fn canonical_keys_come_out_sorted(
            keys in proptest::collection::vec("[a-zA-Z0-9_]{1,12}", 1..8)
        ) {
            let mut map = serde_json::Map::new();
            for (i, k) in keys.iter().enumerate() {
                map.insert(k.clone(), json!(i));
            }
            let out = canonical_json(&serde_json::Value::Object(map)).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
            let out_keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
            let mut sorted = out_keys.clone();
            sorted.sort();
            proptest::prop_assert_eq!(out_keys, sorted);
        }

        #[test]
        fn reencoding_canonical_form_is_a_fixed_point(s in "[ -~]{0,40}") {
            let v = json!({"b": s, "a": [1, 2.5, null]});
            let once = canonical_json(&v).unwrap();
            let reparsed: serde_json::Value = serde_json::from_str(&once).unwrap();
            proptest::prop_assert_eq!(once, canonical_json(&reparsed).unwrap());
        }
    }
}
