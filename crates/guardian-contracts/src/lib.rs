//! # guardian-contracts
//!
//! Shared types and contracts for the guardian governance audit log.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only the event data model, validation reports and the error
//! type.

pub mod error;
pub mod event;
pub mod validation;
