//! Error types for the governance audit pipeline.
//!
//! Every fallible operation on the ingestion path returns `GuardianResult<T>`.
//! The variants mirror the failure classes callers must tell apart: a bad
//! deployment, a bad caller, a bad event, a log that can no longer be
//! trusted, and a disk that refused the write.

use thiserror::Error;

use crate::validation::Violation;

/// The unified error type for the governance audit pipeline.
#[derive(Debug, Error)]
pub enum GuardianError {
    /// A required setting (shared secret, schema definition) is missing or
    /// unusable.
    ///
    /// Raised at startup only.  The subsystem must not serve traffic after
    /// seeing this.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// The caller did not present a valid governance key.
    ///
    /// Carries no detail: every gate failure looks the same.
    #[error("invalid key")]
    Unauthorized,

    /// The event (or the report it was built from) violates the schema.
    #[error("event failed schema validation: {} violation(s)", .violations.len())]
    Validation { violations: Vec<Violation> },

    /// The tail of the existing log cannot be trusted as a chain link.
    ///
    /// Appending past it would fork the chain, so the store refuses.
    #[error("audit chain corrupted: {reason}")]
    ChainCorruption { reason: String },

    /// The append did not durably complete.
    #[error("audit storage failure: {reason}")]
    Storage { reason: String },
}

impl GuardianError {
    /// Build a `Validation` error carrying a single violation.
    pub fn violation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![Violation::new(path, reason)],
        }
    }
}

/// Convenience alias used throughout the guardian crates.
pub type GuardianResult<T> = Result<T, GuardianError>;
