//! # guardian-core
//!
//! The ingestion pipeline for the guardian governance audit log.
//!
//! This crate provides:
//! - The two core traits (`EventValidator`, `ChainStore`)
//! - The `Ingestor` that wires them together in the correct trust order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardian_core::{Ingestor, traits::{ChainStore, EventValidator}};
//!
//! let ingestor = Ingestor::new(validator, store, "v0.2");
//! let event = ingestor.ingest(report)?;
//! ```

pub mod ingest;
pub mod traits;

pub use ingest::Ingestor;
