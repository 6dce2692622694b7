//! Harm-override report and event types.
//!
//! A caller submits a `HarmOverrideReport`.  The ingestion pipeline turns it
//! into a `CandidateEvent` (complete except for the integrity block), the
//! chain store seals that into a `FinalizedEvent`, and the finalized record
//! is what lands on disk as one JSON line.
//!
//! `CandidateEvent` has no mutators: the only way forward is `finalize()`,
//! which consumes it.  What gets validated is therefore exactly what gets
//! hashed and written.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{GuardianError, GuardianResult};

/// The `event_type` literal for every event in this log.
pub const EVENT_TYPE: &str = "HARM_OVERRIDE";

/// The digest family recorded in every integrity block.
pub const HASH_ALGORITHM: &str = "sha256";

/// The `previous_event_hash` of the first event in an empty chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Top-level key holding the integrity block.  Everything else is payload.
pub const INTEGRITY_FIELD: &str = "cryptographic_integrity";

/// Default review window when the caller does not specify one.
pub const DEFAULT_REVIEW_SLA_HOURS: u32 = 24;

// ── Caller input ──────────────────────────────────────────────────────────────

/// A harm-override report as submitted by the decision system.
///
/// Every member is optional on the wire and every leaf is carried as raw
/// JSON: type checking belongs to the schema, which reports a mistyped
/// value at its own path.  Defaults are filled when the candidate event is
/// built; fields without a sensible default are left absent so the schema
/// reports them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarmOverrideReport {
    pub request_context: RequestContext,
    /// Passed through untouched; only the schema looks inside.
    pub risk_assessment: Option<Value>,
    pub override_decision: OverrideDecisionReport,
    pub accountability: AccountabilityReport,
}

/// Who asked, through which channel, and about whom.
///
/// Shared between report and event: no field here has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_role: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverrideDecisionReport {
    pub override_applied: Option<Value>,
    pub least_intrusive_means: Option<Value>,
    pub proportionality: Option<Value>,
    pub time_limited: Option<Value>,
    pub actions_taken: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountabilityReport {
    pub logged: Option<Value>,
    pub review_required: Option<Value>,
    /// Any JSON number; fractional hours are allowed.
    pub review_sla_hours: Option<Value>,
}

// ── Event body ────────────────────────────────────────────────────────────────

/// The decision recorded by the event, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideDecision {
    pub override_applied: Value,
    pub least_intrusive_means: Value,
    pub proportionality: Value,
    pub time_limited: Value,
    pub actions_taken: Value,
}

impl From<OverrideDecisionReport> for OverrideDecision {
    fn from(report: OverrideDecisionReport) -> Self {
        Self {
            // Policy: an event reaching this log implies the override
            // happened unless the caller explicitly says otherwise.
            override_applied: report.override_applied.unwrap_or(Value::Bool(true)),
            least_intrusive_means: report.least_intrusive_means.unwrap_or(Value::Bool(false)),
            proportionality: report.proportionality.unwrap_or(Value::Bool(false)),
            time_limited: report.time_limited.unwrap_or(Value::Bool(false)),
            actions_taken: report
                .actions_taken
                .unwrap_or_else(|| Value::Array(Vec::new())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accountability {
    pub logged: Value,
    pub review_required: Value,
    pub review_sla_hours: Value,
}

impl From<AccountabilityReport> for Accountability {
    fn from(report: AccountabilityReport) -> Self {
        Self {
            logged: report.logged.unwrap_or(Value::Bool(true)),
            review_required: report.review_required.unwrap_or(Value::Bool(true)),
            review_sla_hours: report
                .review_sla_hours
                .unwrap_or_else(|| Value::from(DEFAULT_REVIEW_SLA_HOURS)),
        }
    }
}

/// The hashed part of a harm-override event: every field except the
/// integrity block.
#[derive(Debug, Clone, Serialize)]
pub struct HarmOverrideEvent {
    pub event_id: String,
    pub event_type: String,
    pub timestamp_utc: String,
    pub constitution_version: String,
    pub request_context: RequestContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<Value>,
    pub override_decision: OverrideDecision,
    pub accountability: Accountability,
}

/// The integrity block attached when an event joins the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptographicIntegrity {
    pub hash_algorithm: String,
    pub previous_event_hash: String,
    pub event_hash: String,
    /// Reserved.  Always `null` today.
    pub signature: Option<String>,
}

impl CryptographicIntegrity {
    /// A SHA-256 integrity block with an empty signature slot.
    pub fn sha256(previous_event_hash: impl Into<String>, event_hash: impl Into<String>) -> Self {
        Self {
            hash_algorithm: HASH_ALGORITHM.to_string(),
            previous_event_hash: previous_event_hash.into(),
            event_hash: event_hash.into(),
            signature: None,
        }
    }

    fn to_value(&self) -> Value {
        json!({
            "hash_algorithm": self.hash_algorithm,
            "previous_event_hash": self.previous_event_hash,
            "event_hash": self.event_hash,
            "signature": self.signature,
        })
    }
}

// ── Candidate / finalized ─────────────────────────────────────────────────────

/// A fully built event that has not yet been chained.
///
/// The payload is always a JSON object and never contains
/// `cryptographic_integrity`.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEvent {
    event_id: String,
    payload: Value,
}

impl CandidateEvent {
    /// Build the candidate for `report`, stamped with a fresh event id,
    /// the configured constitution version and `at`.
    pub fn from_report(
        report: HarmOverrideReport,
        constitution_version: &str,
        at: DateTime<Utc>,
    ) -> GuardianResult<Self> {
        let event = HarmOverrideEvent {
            event_id: format!("hoe_{}", Uuid::new_v4()),
            event_type: EVENT_TYPE.to_string(),
            timestamp_utc: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            constitution_version: constitution_version.to_string(),
            request_context: report.request_context,
            risk_assessment: report.risk_assessment,
            override_decision: report.override_decision.into(),
            accountability: report.accountability.into(),
        };
        let payload = serde_json::to_value(&event)
            .map_err(|e| GuardianError::violation("/", format!("event is not encodable: {e}")))?;
        Ok(Self {
            event_id: event.event_id,
            payload,
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// The exact value that will be hashed and persisted.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Seal the candidate with its integrity block.
    pub fn finalize(self, integrity: CryptographicIntegrity) -> FinalizedEvent {
        let mut record = self.payload;
        if let Value::Object(map) = &mut record {
            map.insert(INTEGRITY_FIELD.to_string(), integrity.to_value());
        }
        FinalizedEvent {
            event_id: self.event_id,
            record,
            integrity,
        }
    }
}

/// An event with its integrity block attached, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedEvent {
    event_id: String,
    record: Value,
    integrity: CryptographicIntegrity,
}

impl FinalizedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn integrity(&self) -> &CryptographicIntegrity {
        &self.integrity
    }

    pub fn event_hash(&self) -> &str {
        &self.integrity.event_hash
    }

    /// The full record, integrity block included.
    pub fn record(&self) -> &Value {
        &self.record
    }

    /// Compact single-line JSON, without the trailing newline.
    pub fn to_json_line(&self) -> GuardianResult<String> {
        serde_json::to_string(&self.record).map_err(|e| GuardianError::Storage {
            reason: format!("failed to encode event {}: {e}", self.event_id),
        })
    }
}
