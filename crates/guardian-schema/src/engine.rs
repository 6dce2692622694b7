//! Schema-based event validator for the guardian audit log.
//!
//! `SchemaValidator` implements the `EventValidator` trait from
//! `guardian-core`.  Validation runs in two phases:
//!
//! 1. **Structural**: the event is validated against the versioned
//!    harm-override schema using the `jsonschema` crate.
//! 2. **Semantic**: checks JSON Schema cannot express (the timestamp must
//!    be UTC, not merely RFC 3339).
//!
//! All violations are collected before returning so operators see the full
//! failure set in one pass.
//!
//! Two validators are compiled from the one schema document: the schema as
//! written (for finalized events) and a copy that does not yet require the
//! integrity block (for candidates).  Both always come from the same file,
//! so the two can never drift apart.

use std::path::Path;

use chrono::DateTime;
use jsonschema::Validator;
use serde_json::Value;
use tracing::{debug, info};

use guardian_contracts::{
    error::{GuardianError, GuardianResult},
    event::INTEGRITY_FIELD,
    validation::{ValidationReport, Violation},
};
use guardian_core::traits::EventValidator;

/// Where the server and the verifier look for the schema by default,
/// relative to their working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "governance/HARM_OVERRIDE_EVENT_SCHEMA.json";

/// The guardian event validator.
///
/// Construct once at startup via `from_file`; a missing or broken schema is
/// a `Configuration` error and the caller must not start serving.
pub struct SchemaValidator {
    /// `$id` of the loaded schema, or `"unversioned"`.
    schema_id: String,
    finalized: Validator,
    candidate: Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_id", &self.schema_id)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Read and compile the schema document at `path`.
    pub fn from_file(path: &Path) -> GuardianResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| GuardianError::Configuration {
                reason: format!("failed to read event schema '{}': {}", path.display(), e),
            })?;
        let validator = Self::from_json_str(&contents)?;
        info!(
            schema_id = %validator.schema_id,
            path = %path.display(),
            "event schema loaded"
        );
        Ok(validator)
    }

    /// Parse `s` as a JSON Schema document and compile it.
    pub fn from_json_str(s: &str) -> GuardianResult<Self> {
        let schema: Value = serde_json::from_str(s).map_err(|e| GuardianError::Configuration {
            reason: format!("event schema is not valid JSON: {}", e),
        })?;
        Self::from_value(&schema)
    }

    /// Compile an already-parsed schema document.
    pub fn from_value(schema: &Value) -> GuardianResult<Self> {
        let schema_id = schema
            .get("$id")
            .and_then(Value::as_str)
            .unwrap_or("unversioned")
            .to_string();

        Ok(Self {
            finalized: compile(schema)?,
            candidate: compile(&candidate_schema(schema))?,
            schema_id,
        })
    }

    fn run(&self, validator: &Validator, event: &Value) -> ValidationReport {
        let mut violations: Vec<Violation> = Vec::new();

        // ── Phase 1: JSON Schema structural validation ────────────────────────
        for error in validator.iter_errors(event) {
            violations.push(Violation::new(error.instance_path.to_string(), error.to_string()));
        }

        // ── Phase 2: Semantic rules ───────────────────────────────────────────
        if let Some(violation) = check_utc_timestamp(event, &violations) {
            violations.push(violation);
        }

        let report = ValidationReport::from_violations(violations);
        debug!(
            schema_id = %self.schema_id,
            passed = report.passed,
            violation_count = report.violations.len(),
            "validation complete"
        );
        report
    }
}

impl EventValidator for SchemaValidator {
    fn validate(&self, event: &Value) -> ValidationReport {
        self.run(&self.finalized, event)
    }

    fn validate_candidate(&self, candidate: &Value) -> ValidationReport {
        self.run(&self.candidate, candidate)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn compile(schema: &Value) -> GuardianResult<Validator> {
    jsonschema::options()
        .should_validate_formats(true)
        .build(schema)
        .map_err(|e| GuardianError::Configuration {
            reason: format!("invalid event schema document: {}", e),
        })
}

/// The candidate variant of `schema`: identical, except the integrity block
/// is dropped from the top-level `required` list.  Its property constraints
/// still apply if a candidate somehow carries one.
fn candidate_schema(schema: &Value) -> Value {
    let mut candidate = schema.clone();
    if let Some(required) = candidate.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|field| field.as_str() != Some(INTEGRITY_FIELD));
    }
    candidate
}

/// `timestamp_utc` must carry a zero UTC offset.
///
/// Skipped when the structural phase already flagged the field, so a single
/// bad timestamp is reported once.
fn check_utc_timestamp(event: &Value, existing: &[Violation]) -> Option<Violation> {
    const PATH: &str = "/timestamp_utc";

    let raw = event.get("timestamp_utc")?.as_str()?;
    if existing.iter().any(|v| v.path == PATH) {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) if ts.offset().local_minus_utc() == 0 => None,
        Ok(_) => Some(Violation::new(
            PATH,
            format!("\"{raw}\" is not a UTC timestamp"),
        )),
        Err(e) => Some(Violation::new(
            PATH,
            format!("\"{raw}\" is not an RFC 3339 timestamp: {e}"),
        )),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
