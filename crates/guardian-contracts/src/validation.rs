//! Schema validation report types.
//!
//! A validator never fails on a well-typed but non-conforming event; it
//! returns a `ValidationReport` listing every violation it found so callers
//! see the full picture in one pass.

use serde::{Deserialize, Serialize};

/// The result of validating one event against the governance schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if no violation was found.
    pub passed: bool,
    /// Every violation, in discovery order.  Empty on pass.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Build a report from a violation list; `passed` is derived.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer to the offending value, `/` for the document root.
    pub path: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl Violation {
    /// An empty path is normalized to `/` so the root is always addressable.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            reason: reason.into(),
        }
    }
}
