//! Core trait definitions for the governance audit pipeline.
//!
//! Two traits define the trust boundary behind the governance gate:
//!
//! - `EventValidator`: trusted checker (schema conformance of an event)
//! - `ChainStore`: trusted sink (hash-chains and persists an event)
//!
//! The `Ingestor` wires them together in the correct order: nothing reaches
//! the store unless the validator has passed the exact candidate it will
//! append.

use serde_json::Value;

use guardian_contracts::{
    error::GuardianResult,
    event::{CandidateEvent, FinalizedEvent},
    validation::ValidationReport,
};

/// Schema conformance checks for harm-override events.
///
/// Implementations never fail on a non-conforming event: violations are
/// returned as data in the `ValidationReport`.
pub trait EventValidator: Send + Sync {
    /// Validate a complete event, integrity block included.
    fn validate(&self, event: &Value) -> ValidationReport;

    /// Validate an unchained candidate.
    ///
    /// Identical to `validate` except that the integrity block is not yet
    /// required.
    fn validate_candidate(&self, candidate: &Value) -> ValidationReport;
}

/// The append-only hash-chained log.
///
/// Implementations must serialize `append` calls: reading the previous hash,
/// computing the new one and writing the line are a single critical section.
pub trait ChainStore: Send + Sync {
    /// Chain `candidate` onto the current tip and persist it durably.
    ///
    /// Returns `ChainCorruption` if the tip cannot be trusted and `Storage`
    /// if the write did not complete.  Success is only reported after the
    /// line is on disk.
    fn append(&self, candidate: CandidateEvent) -> GuardianResult<FinalizedEvent>;
}
