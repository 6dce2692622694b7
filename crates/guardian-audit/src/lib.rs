//! # guardian-audit
//!
//! Append-only, SHA-256 hash-chained audit log for harm-override events.
//!
//! ## Overview
//!
//! Each event is stored as one JSON line.  Its `cryptographic_integrity`
//! block names the previous event's hash and its own hash, computed over the
//! canonical encoding of every other field plus that previous hash.  Changing
//! any byte of any line, or reordering or dropping lines, breaks the chain
//! and is detected by `LogVerifier`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardian_audit::{FileChainStore, LogVerifier};
//! use guardian_core::traits::ChainStore;
//!
//! let store = FileChainStore::new("audit_events.jsonl", validator.clone());
//! let event = store.append(candidate)?;
//!
//! let verified = LogVerifier::new("audit_events.jsonl").verify()?;
//! assert_eq!(verified.tip_hash, event.event_hash());
//! ```

pub mod canonical;
pub mod chain;
pub mod store;
pub mod verify;

pub use canonical::canonical_json;
pub use chain::event_digest;
pub use store::FileChainStore;
pub use verify::{ChainBreak, ChainVerification, LogVerifier};

// ── Test helpers ──────────────────────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────
