//! Independent replay of an on-disk audit log.
//!
//! `LogVerifier` shares nothing with the writer except `event_digest`.  It
//! walks the file from the first line, recomputes every hash and stops at the
//! first line that does not link.  Line numbers in `ChainBreak` are 1-based.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use guardian_contracts::{
    event::{GENESIS_HASH, HASH_ALGORITHM},
    validation::Violation,
};
use guardian_core::traits::EventValidator;

use crate::chain::{event_digest, DeclaredIntegrity};

/// A log that replayed cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// Number of events in the log.
    pub events: u64,
    /// `event_hash` of the last event; `GENESIS_HASH` for an empty log.
    pub tip_hash: String,
}

/// Where and why replay stopped.
#[derive(Debug, Error)]
pub enum ChainBreak {
    #[error("audit log not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read audit log: {source}")]
    Io {
        #[source]
        source: io::Error,
    },

    #[error("line {line}: not valid JSON: {reason}")]
    Parse { line: u64, reason: String },

    #[error("line {line}: missing {field}")]
    MissingField { line: u64, field: String },

    #[error("line {line}: unsupported hash algorithm {found:?}")]
    AlgorithmMismatch { line: u64, found: String },

    #[error("line {line}: previous_event_hash {found} does not match expected {expected}")]
    PreviousHashMismatch {
        line: u64,
        expected: String,
        found: String,
    },

    #[error("line {line}: event_hash {declared} does not match recomputed {recomputed}")]
    HashMismatch {
        line: u64,
        declared: String,
        recomputed: String,
    },

    #[error("line {line}: {} schema violation(s), first at {}", .violations.len(), first_path(.violations))]
    Schema { line: u64, violations: Vec<Violation> },

    #[error("line {line}: missing trailing newline (truncated write)")]
    Truncated { line: u64 },
}

impl ChainBreak {
    /// The 1-based line the break was detected on, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            ChainBreak::NotFound { .. } | ChainBreak::Io { .. } => None,
            ChainBreak::Parse { line, .. }
            | ChainBreak::MissingField { line, .. }
            | ChainBreak::AlgorithmMismatch { line, .. }
            | ChainBreak::PreviousHashMismatch { line, .. }
            | ChainBreak::HashMismatch { line, .. }
            | ChainBreak::Schema { line, .. }
            | ChainBreak::Truncated { line } => Some(*line),
        }
    }
}

fn first_path(violations: &[Violation]) -> &str {
    violations.first().map(|v| v.path.as_str()).unwrap_or("/")
}

impl From<io::Error> for ChainBreak {
    fn from(source: io::Error) -> Self {
        ChainBreak::Io { source }
    }
}

/// Replays a JSON Lines audit log and checks every link.
pub struct LogVerifier {
    path: PathBuf,
    validator: Option<Arc<dyn EventValidator>>,
}

impl LogVerifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            validator: None,
        }
    }

    /// Also check each record against the event schema.
    pub fn with_validator(mut self, validator: Arc<dyn EventValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Walk the log and stop at the first broken link.
    ///
    /// Per line, in order: terminating newline, JSON parse, integrity
    /// fields present, algorithm, previous-hash link, recomputed hash, and
    /// (if a validator is attached) the schema.
    pub fn verify(&self) -> Result<ChainVerification, ChainBreak> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ChainBreak::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);

        let mut expected_prev = GENESIS_HASH.to_string();
        let mut events: u64 = 0;
        let mut buf: Vec<u8> = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = events + 1;

            if buf.pop() != Some(b'\n') {
                return Err(self.fail(ChainBreak::Truncated { line }));
            }

            let record: Value = serde_json::from_slice(&buf).map_err(|e| {
                self.fail(ChainBreak::Parse {
                    line,
                    reason: e.to_string(),
                })
            })?;

            let declared = DeclaredIntegrity::from_record(&record)
                .map_err(|field| self.fail(ChainBreak::MissingField { line, field }))?;

            if declared.hash_algorithm != HASH_ALGORITHM {
                return Err(self.fail(ChainBreak::AlgorithmMismatch {
                    line,
                    found: declared.hash_algorithm,
                }));
            }

            if declared.previous_event_hash != expected_prev {
                return Err(self.fail(ChainBreak::PreviousHashMismatch {
                    line,
                    expected: expected_prev,
                    found: declared.previous_event_hash,
                }));
            }

            let recomputed = event_digest(&record, &declared.previous_event_hash);
            if recomputed != declared.event_hash {
                return Err(self.fail(ChainBreak::HashMismatch {
                    line,
                    declared: declared.event_hash,
                    recomputed,
                }));
            }

            if let Some(validator) = &self.validator {
                let report = validator.validate(&record);
                if !report.passed {
                    return Err(self.fail(ChainBreak::Schema {
                        line,
                        violations: report.violations,
                    }));
                }
            }

            expected_prev = declared.event_hash;
            events = line;
        }

        debug!(path = %self.path.display(), events, tip = %expected_prev, "audit log verified");
        Ok(ChainVerification {
            events,
            tip_hash: expected_prev,
        })
    }

    fn fail(&self, brk: ChainBreak) -> ChainBreak {
        error!(path = %self.path.display(), error = %brk, "audit chain broken");
        brk
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use serde_json::json;

    use guardian_contracts::event::GENESIS_HASH;
    use guardian_core::traits::ChainStore;

    use crate::store::FileChainStore;
    use crate::test_support::{candidate, AcceptAll};

    use super::{ChainBreak, LogVerifier};

    fn populated(dir: &tempfile::TempDir, n: usize) -> FileChainStore {
        let store = FileChainStore::new(dir.path().join("log.jsonl"), Arc::new(AcceptAll));
        for i in 0..n {
            store.append(candidate(&format!("event number {i}"))).unwrap();
        }
        store
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LogVerifier::new(dir.path().join("absent.jsonl")).verify().unwrap_err();
        assert!(matches!(err, ChainBreak::NotFound { .. }));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn empty_file_verifies_to_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(&path, b"").unwrap();

        let verified = LogVerifier::new(&path).verify().unwrap();
        assert_eq!(verified.events, 0);
        assert_eq!(verified.tip_hash, GENESIS_HASH);
    }

    #[test]
    fn missing_trailing_newline_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = populated(&dir, 2);
        let mut contents = fs::read_to_string(store.path()).unwrap();
        contents.pop();
        fs::write(store.path(), contents).unwrap();

        let err = LogVerifier::new(store.path()).verify().unwrap_err();
        assert!(matches!(err, ChainBreak::Truncated { line: 2 }));
    }

    #[test]
    fn blank_line_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = populated(&dir, 1);
        let mut contents = fs::read_to_string(store.path()).unwrap();
        contents.push('\n');
        fs::write(store.path(), contents).unwrap();

        let err = LogVerifier::new(store.path()).verify().unwrap_err();
        assert!(matches!(err, ChainBreak::Parse { line: 2, .. }));
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let line = json!({
            "event_id": "evt-00000001",
            "cryptographic_integrity": {
                "hash_algorithm": "sha1",
                "previous_event_hash": GENESIS_HASH,
                "event_hash": GENESIS_HASH,
                "signature": null
            }
        });
        fs::write(&path, format!("{}\n", line)).unwrap();

        let err = LogVerifier::new(&path).verify().unwrap_err();
        assert!(matches!(err, ChainBreak::AlgorithmMismatch { line: 1, .. }));
    }

    #[test]
    fn record_without_integrity_block_names_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(&path, "{\"event_id\":\"evt-00000001\"}\n").unwrap();

        match LogVerifier::new(&path).verify().unwrap_err() {
            ChainBreak::MissingField { line, field } => {
                assert_eq!(line, 1);
                assert_eq!(field, "cryptographic_integrity");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn dropped_middle_line_breaks_the_link() {
        let dir = tempfile::tempdir().unwrap();
        let store = populated(&dir, 3);
        let contents = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        fs::write(store.path(), format!("{}\n{}\n", lines[0], lines[2])).unwrap();

        let err = LogVerifier::new(store.path()).verify().unwrap_err();
        assert!(matches!(err, ChainBreak::PreviousHashMismatch { line: 2, .. }));
    }

    #[test]
    fn schema_violation_is_reported_when_validator_attached() {
        use guardian_contracts::validation::{ValidationReport, Violation};
        use guardian_core::traits::EventValidator;
        use serde_json::Value;

        struct NoCaseId;
        impl EventValidator for NoCaseId {
            fn validate(&self, event: &Value) -> ValidationReport {
                let mut violations = Vec::new();
                if event.pointer("/request_context/case_id").is_none() {
                    violations.push(Violation::new("/request_context", "case_id required"));
                }
                ValidationReport::from_violations(violations)
            }
            fn validate_candidate(&self, candidate: &Value) -> ValidationReport {
                self.validate(candidate)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = populated(&dir, 1);

        assert!(LogVerifier::new(store.path()).verify().is_ok());
        let err = LogVerifier::new(store.path())
            .with_validator(Arc::new(NoCaseId))
            .verify()
            .unwrap_err();
        match err {
            ChainBreak::Schema { line, violations } => {
                assert_eq!(line, 1);
                assert_eq!(violations[0].path, "/request_context");
            }
            other => panic!("expected Schema, got {other:?}"),
        }
    }
}
