//! Hash-chain primitives: the event digest and integrity-block access.
//!
//! `event_digest` is the only place an event hash is computed.  The chain
//! store uses it to seal new events and the log verifier uses it to
//! recompute them; any second implementation would be a way for the two to
//! silently disagree.
//!
//! Hash input layout (bytes, in order):
//!   1. canonical JSON of the event with `cryptographic_integrity` removed
//!   2. previous_event_hash as UTF-8 bytes (64 ASCII hex chars)

use std::borrow::Cow;

use serde_json::Value;
use sha2::{Digest, Sha256};

use guardian_contracts::event::INTEGRITY_FIELD;

use crate::canonical::canonical_bytes;

/// Compute the SHA-256 hash of an event linked to `previous_hash`.
///
/// `record` may be a candidate payload or a full persisted record; a
/// top-level integrity block is excluded from the hash input either way.
///
/// Returns a lowercase 64-character hex string.
pub fn event_digest(record: &Value, previous_hash: &str) -> String {
    let payload: Cow<'_, Value> = match record {
        Value::Object(map) if map.contains_key(INTEGRITY_FIELD) => {
            let mut map = map.clone();
            map.remove(INTEGRITY_FIELD);
            Cow::Owned(Value::Object(map))
        }
        other => Cow::Borrowed(other),
    };

    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(&payload));
    hasher.update(previous_hash.as_bytes());

    hex::encode(hasher.finalize())
}

/// True if `s` is a 64-character lowercase hex digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// The integrity fields a persisted line declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredIntegrity {
    pub hash_algorithm: String,
    pub previous_event_hash: String,
    pub event_hash: String,
    pub signature: Option<String>,
}

impl DeclaredIntegrity {
    /// Pull the integrity fields out of a persisted record.
    ///
    /// `signature` must be present but may be `null`.  On failure returns
    /// the dotted name of the first missing (or mistyped) field.
    pub fn from_record(record: &Value) -> Result<Self, String> {
        let block = record
            .get(INTEGRITY_FIELD)
            .filter(|v| v.is_object())
            .ok_or_else(|| INTEGRITY_FIELD.to_string())?;

        let field = |name: &str| -> Result<String, String> {
            block
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("{INTEGRITY_FIELD}.{name}"))
        };

        let signature = match block.get("signature") {
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            _ => return Err(format!("{INTEGRITY_FIELD}.signature")),
        };

        Ok(Self {
            hash_algorithm: field("hash_algorithm")?,
            previous_event_hash: field("previous_event_hash")?,
            event_hash: field("event_hash")?,
            signature,
        })
    }
}
