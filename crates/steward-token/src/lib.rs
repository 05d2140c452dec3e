// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-token
//!
//! HMAC-SHA-256 approval tokens. A token authorizes exactly one queue item:
//! its payload binds the item's `qid` and `spec_hash`, carries an absolute
//! expiry in unix seconds, and is signed with the shared executor secret.
//!
//! Wire form: `b64url(canonical({"payload": P, "sig": b64url(HMAC(canonical(P)))}))`
//! with no base64 padding anywhere. Canonical JSON is defined in
//! [`steward_core::canonical_json`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use steward_core::canonical_json;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur while minting a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The shared secret is empty; nothing may be signed with it.
    #[error("refusing to mint with an empty secret")]
    EmptySecret,

    /// The payload could not be serialized.
    #[error("token payload serialization failed: {0}")]
    Encode(#[from] steward_core::ContractError),
}

/// A verified approval: the decoded token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    /// Action kind this token authorizes (e.g. `send_email`).
    pub token_type: String,
    /// Random token id (uuid v4).
    pub jti: String,
    /// Absolute expiry, unix seconds.
    pub exp: i64,
    /// Binding map; for queue items always `{qid, spec_hash}`.
    pub bind: BTreeMap<String, serde_json::Value>,
}

impl Approval {
    /// Fetch a bind entry as a string, empty when absent or non-string.
    pub fn bind_str(&self, key: &str) -> &str {
        self.bind.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Whether the token is expired at `now` (unix seconds).
    pub fn expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

#[derive(Serialize, Deserialize)]
struct Blob {
    payload: serde_json::Value,
    sig: String,
}

/// Current unix time in whole seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Convenience constructor for the standard queue-item binding.
pub fn bind_queue_item(qid: &str, spec_hash: &str) -> BTreeMap<String, serde_json::Value> {
    BTreeMap::from([
        ("qid".to_string(), serde_json::Value::from(qid)),
        ("spec_hash".to_string(), serde_json::Value::from(spec_hash)),
    ])
}

/// Mint a token expiring `ttl_s` seconds from now.
///
/// # Errors
///
/// [`TokenError::EmptySecret`] when `secret` is empty; serialization failures
/// are surfaced as [`TokenError::Encode`].
pub fn mint(
    secret: &[u8],
    token_type: &str,
    ttl_s: i64,
    bind: BTreeMap<String, serde_json::Value>,
) -> Result<String, TokenError> {
    mint_with_exp(secret, token_type, unix_now() + ttl_s, bind)
}

/// Mint a token with an explicit absolute expiry (unix seconds).
pub fn mint_with_exp(
    secret: &[u8],
    token_type: &str,
    exp: i64,
    bind: BTreeMap<String, serde_json::Value>,
) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }

    let approval = Approval {
        token_type: token_type.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp,
        bind,
    };
    let payload = serde_json::to_value(&approval).map_err(steward_core::ContractError::from)?;
    let payload_canonical = canonical_json(&payload)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload_canonical.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    let blob = Blob { payload, sig };
    let blob_canonical = canonical_json(&blob)?;
    Ok(URL_SAFE_NO_PAD.encode(blob_canonical.as_bytes()))
}

/// Verify a token's signature under `secret` and decode its payload.
///
/// Returns `None` on any decoding or signature failure. Expiry is *not*
/// checked here; callers compare [`Approval::exp`] against their own clock.
pub fn verify(secret: &[u8], token: &str) -> Option<Approval> {
    if secret.is_empty() {
        return None;
    }

    let raw = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
    let blob: Blob = serde_json::from_slice(&raw).ok()?;
    let payload_canonical = canonical_json(&blob.payload).ok()?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(blob.sig.as_bytes()).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload_canonical.as_bytes());
    mac.verify_slice(&sig_bytes).ok()?;

    serde_json::from_value(blob.payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &[u8] = b"secret";

    #[test]
    fn roundtrip_preserves_payload() {
        let tok = mint(SECRET, "send_email", 10, bind_queue_item("x", "y")).unwrap();
        let appr = verify(SECRET, &tok).expect("token should verify");
        assert_eq!(appr.token_type, "send_email");
        assert_eq!(appr.bind_str("qid"), "x");
        assert_eq!(appr.bind_str("spec_hash"), "y");
        assert!(!appr.expired_at(unix_now()));
    }

    #[test]
    fn wrong_secret_fails() {
        let tok = mint(SECRET, "send_email", 10, bind_queue_item("x", "y")).unwrap();
        assert!(verify(b"other", &tok).is_none());
    }

    #[test]
    fn tampered_payload_fails() {
        let tok = mint(SECRET, "send_email", 10, bind_queue_item("x", "y")).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(tok.as_bytes()).unwrap();
        let mut blob: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        blob["payload"]["bind"]["qid"] = serde_json::Value::from("z");
        let forged =
            URL_SAFE_NO_PAD.encode(canonical_json(&blob).unwrap().as_bytes());
        assert!(verify(SECRET, &forged).is_none());
    }

    #[test]
    fn garbage_tokens_fail_quietly() {
        assert!(verify(SECRET, "").is_none());
        assert!(verify(SECRET, "not-base64!!!").is_none());
        assert!(
            verify(SECRET, &URL_SAFE_NO_PAD.encode(b"{\"payload\":1}")).is_none()
        );
    }

    #[test]
    fn empty_secret_never_mints_or_verifies() {
        assert!(matches!(
            mint(b"", "send_email", 10, bind_queue_item("x", "y")),
            Err(TokenError::EmptySecret)
        ));
        let tok = mint(SECRET, "send_email", 10, bind_queue_item("x", "y")).unwrap();
        assert!(verify(b"", &tok).is_none());
    }

    #[test]
    fn expiry_is_absolute() {
        let tok = mint_with_exp(SECRET, "create_event", unix_now() - 1, bind_queue_item("q", "h"))
            .unwrap();
        let appr = verify(SECRET, &tok).expect("signature still valid");
        assert!(appr.expired_at(unix_now()));
    }

    #[test]
    fn jti_is_unique_per_mint() {
        let a = verify(SECRET, &mint(SECRET, "t", 10, BTreeMap::new()).unwrap()).unwrap();
        let b = verify(SECRET, &mint(SECRET, "t", 10, BTreeMap::new()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn token_is_urlsafe_without_padding() {
        let tok = mint(SECRET, "forum_reply", 600, bind_queue_item("q", "h")).unwrap();
        assert!(!tok.contains('='));
        assert!(!tok.contains('+'));
        assert!(!tok.contains('/'));
    }

    proptest! {
        #[test]
        fn arbitrary_binds_roundtrip(qid in "[a-z0-9_]{1,32}", hash in "[a-f0-9]{64}") {
            let tok = mint(SECRET, "send_email", 60, bind_queue_item(&qid, &hash)).unwrap();
            let appr = verify(SECRET, &tok).unwrap();
            prop_assert_eq!(appr.bind_str("qid"), qid.as_str());
            prop_assert_eq!(appr.bind_str("spec_hash"), hash.as_str());
        }

        #[test]
        fn truncated_tokens_never_verify(cut in 1usize..20) {
            let tok = mint(SECRET, "send_email", 60, bind_queue_item("q", "h")).unwrap();
            let truncated = &tok[..tok.len().saturating_sub(cut)];
            prop_assert!(verify(SECRET, truncated).is_none());
        }
    }
}
