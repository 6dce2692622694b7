//! # guardian-schema
//!
//! Event validation for the guardian audit log.
//!
//! This crate provides [`engine::SchemaValidator`], which implements the
//! [`guardian_core::traits::EventValidator`] trait.  It validates events in
//! two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate,
//!    against the versioned `HARM_OVERRIDE_EVENT_SCHEMA.json`.
//! 2. **Semantic**: rules the schema language cannot express.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use guardian_schema::SchemaValidator;
//!
//! let validator = SchemaValidator::from_file(Path::new("governance/HARM_OVERRIDE_EVENT_SCHEMA.json"))?;
//! let report = validator.validate(&event);
//! ```

pub mod engine;

pub use engine::{SchemaValidator, DEFAULT_SCHEMA_PATH};
