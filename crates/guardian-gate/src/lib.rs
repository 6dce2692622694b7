//! # guardian-gate
//!
//! The governance gate in front of the audit log.
//!
//! ## Overview
//!
//! Writers must present the configured shared secret in the
//! `x-governance-key` header.  [`GovernanceGate`] performs the check; the
//! HTTP layer decides what a rejection looks like on the wire.
//!
//! ```rust,ignore
//! use guardian_gate::GovernanceGate;
//!
//! let gate = GovernanceGate::new(std::env::var("GUARDIAN_GOVERNANCE_KEY").ok())?;
//! gate.authorize(headers.get(GOVERNANCE_KEY_HEADER).map(|v| v.as_bytes()))?;
//! ```

pub mod gate;

pub use gate::{GovernanceGate, GOVERNANCE_KEY_HEADER};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use guardian_contracts::error::GuardianError;

    use super::GovernanceGate;

    fn gate() -> GovernanceGate {
        GovernanceGate::new(Some("s3cret-governance-key".to_string())).unwrap()
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        assert!(matches!(
            GovernanceGate::new(None),
            Err(GuardianError::Configuration { .. })
        ));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(
            GovernanceGate::new(Some(String::new())),
            Err(GuardianError::Configuration { .. })
        ));
    }

    #[test]
    fn exact_key_is_accepted() {
        assert!(gate().authorize(Some(b"s3cret-governance-key")).is_ok());
    }

    #[test]
    fn absent_key_is_unauthorized() {
        assert!(matches!(gate().authorize(None), Err(GuardianError::Unauthorized)));
    }

    #[test]
    fn near_misses_are_unauthorized() {
        let gate = gate();
        let near_misses: [&[u8]; 5] = [
            b"",
            b"s3cret-governance-ke",
            b"s3cret-governance-key ",
            b"S3cret-governance-key",
            b"s3cret-governance-kez",
        ];
        for presented in near_misses {
            assert!(
                matches!(gate.authorize(Some(presented)), Err(GuardianError::Unauthorized)),
                "{:?} must be rejected",
                String::from_utf8_lossy(presented)
            );
        }
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let rendered = format!("{:?}", gate());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("redacted"));
    }
}
