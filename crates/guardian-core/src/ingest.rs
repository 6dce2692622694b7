//! The ingestion pipeline: report → candidate → validated → chained.
//!
//! The ingestor enforces the order of operations for one harm-override
//! report:
//!
//!   Report → CandidateEvent → EventValidator → ChainStore::append
//!
//! The candidate is built in full before anything inspects it, and the very
//! same value is handed to the store.  A candidate that fails validation is
//! never offered to the store.  The governance gate runs in front of this
//! pipeline and is not its concern.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use guardian_contracts::{
    error::{GuardianError, GuardianResult},
    event::{CandidateEvent, FinalizedEvent, HarmOverrideReport},
    validation::Violation,
};

use crate::traits::{ChainStore, EventValidator};

/// Drives one report at a time through validation and chaining.
///
/// Cheap to share: the validator and store are behind `Arc`s, and the store
/// serializes appends internally.
pub struct Ingestor {
    validator: Arc<dyn EventValidator>,
    store: Arc<dyn ChainStore>,
    constitution_version: String,
}

impl Ingestor {
    pub fn new(
        validator: Arc<dyn EventValidator>,
        store: Arc<dyn ChainStore>,
        constitution_version: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            store,
            constitution_version: constitution_version.into(),
        }
    }

    /// Turn `report` into a chained, persisted event.
    ///
    /// # Pipeline
    ///
    /// 1. Build the complete `CandidateEvent` (defaults applied, id and
    ///    timestamp stamped).
    /// 2. Validate the candidate; any violation → `GuardianError::Validation`
    ///    and the store is never touched.
    /// 3. Append the same candidate to the chain store.
    ///
    /// # Errors
    ///
    /// `Validation` for schema failures, `ChainCorruption` or `Storage` from
    /// the store.  Nothing is retried.
    pub fn ingest(&self, report: HarmOverrideReport) -> GuardianResult<FinalizedEvent> {
        // ── Step 1: Build ────────────────────────────────────────────────────
        let candidate = CandidateEvent::from_report(report, &self.constitution_version, Utc::now())?;
        let event_id = candidate.event_id().to_string();
        debug!(event_id = %event_id, "candidate event built");

        // ── Step 2: Validate ─────────────────────────────────────────────────
        let report = self.validator.validate_candidate(candidate.payload());
        if !report.passed {
            warn!(
                event_id = %event_id,
                paths = %violation_paths(&report.violations),
                "event rejected by schema"
            );
            return Err(GuardianError::Validation {
                violations: report.violations,
            });
        }
        debug!(event_id = %event_id, "candidate event validated");

        // ── Step 3: Chain and persist ────────────────────────────────────────
        match self.store.append(candidate) {
            Ok(finalized) => {
                info!(
                    event_id = %event_id,
                    event_hash = %finalized.event_hash(),
                    "harm override event chained"
                );
                Ok(finalized)
            }
            Err(e @ GuardianError::ChainCorruption { .. }) => {
                error!(event_id = %event_id, error = %e, "refusing to append past an untrusted chain tail");
                Err(e)
            }
            Err(e) => {
                error!(event_id = %event_id, error = %e, "audit append failed");
                Err(e)
            }
        }
    }
}

/// Comma-separated violation paths.  Reasons can echo caller text, so they
/// stay out of the logs.
fn violation_paths(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Tests ────────────────────────────────────────────────────────────────────
