//! Shared-secret gate.
//!
//! `GovernanceGate` holds the one secret a caller must present to write to
//! the audit log.  A gate cannot exist without a non-empty secret, so no
//! code path can authorize against a missing or blank key.
//!
//! Comparison runs in constant time over the secret's length; only the
//! length mismatch short-circuits.

use std::fmt;

use subtle::ConstantTimeEq;
use tracing::debug;

use guardian_contracts::error::{GuardianError, GuardianResult};

/// Request header that carries the governance key.
pub const GOVERNANCE_KEY_HEADER: &str = "x-governance-key";

/// Authorizes callers by exact match on a configured shared secret.
pub struct GovernanceGate {
    secret: Vec<u8>,
}

impl GovernanceGate {
    /// Build a gate for `secret`.
    ///
    /// Returns `GuardianError::Configuration` if the secret is absent or
    /// empty.  Startup must fail in that case rather than run open.
    pub fn new(secret: Option<String>) -> GuardianResult<Self> {
        match secret {
            Some(s) if !s.is_empty() => Ok(Self {
                secret: s.into_bytes(),
            }),
            _ => Err(GuardianError::Configuration {
                reason: "governance key is not configured".to_string(),
            }),
        }
    }

    /// Check the key a caller presented.
    ///
    /// `None` (header absent) and any value that differs from the secret by
    /// so much as one byte are both `GuardianError::Unauthorized`.
    pub fn authorize(&self, presented: Option<&[u8]>) -> GuardianResult<()> {
        let presented = presented.ok_or(GuardianError::Unauthorized)?;
        if bool::from(self.secret.as_slice().ct_eq(presented)) {
            debug!("governance key accepted");
            Ok(())
        } else {
            Err(GuardianError::Unauthorized)
        }
    }
}

impl fmt::Debug for GovernanceGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernanceGate")
            .field("secret", &"<redacted>")
            .finish()
    }
}
