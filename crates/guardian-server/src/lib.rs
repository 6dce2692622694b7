//! # guardian-server
//!
//! HTTP front end for the governance audit log.
//!
//! [`bootstrap`] turns a [`ServerConfig`](config::ServerConfig) into an
//! [`AppState`]: it builds the governance gate, loads the event schema and
//! opens the chain store.  Any of those failing is fatal; there is no
//! degraded mode that serves requests without a secret or a schema.
//! [`api::create_router`] then mounts the ingestion route on that state.

pub mod api;
pub mod config;

use std::sync::Arc;

use tracing::info;

use guardian_audit::FileChainStore;
use guardian_contracts::error::GuardianResult;
use guardian_core::Ingestor;
use guardian_gate::GovernanceGate;
use guardian_schema::SchemaValidator;

use crate::config::ServerConfig;

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<GovernanceGate>,
    pub ingestor: Arc<Ingestor>,
}

/// Build the application state from configuration.
///
/// Returns `GuardianError::Configuration` if the governance key is missing
/// or the schema cannot be loaded.
pub fn bootstrap(config: &ServerConfig) -> GuardianResult<AppState> {
    let gate = GovernanceGate::new(config.governance_key.clone())?;
    let validator = Arc::new(SchemaValidator::from_file(&config.schema_path)?);
    let store = Arc::new(FileChainStore::new(
        config.audit_log_path.clone(),
        validator.clone(),
    ));
    let ingestor = Ingestor::new(validator, store, config.constitution_version.clone());

    info!(
        audit_log = %config.audit_log_path.display(),
        constitution_version = %config.constitution_version,
        "governance audit log ready"
    );

    Ok(AppState {
        gate: Arc::new(gate),
        ingestor: Arc::new(ingestor),
    })
}
