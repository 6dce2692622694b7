//! `POST /api/governance/harm-override`

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use guardian_contracts::{
    error::GuardianError,
    event::HarmOverrideReport,
};

use crate::api::error::AppError;
use crate::AppState;

/// Ingest one harm-override report.
///
/// The body is parsed here rather than with the `Json` extractor so a
/// malformed body gets the same `{ok:false, details}` shape as a schema
/// failure.  The append itself is blocking file I/O and runs on the
/// blocking pool.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let report: HarmOverrideReport = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "malformed harm override report");
        GuardianError::violation("/", format!("request body is not a valid report: {e}"))
    })?;
    debug!(bytes = body.len(), "harm override report received");

    let ingestor = state.ingestor.clone();
    let finalized = tokio::task::spawn_blocking(move || ingestor.ingest(report))
        .await
        .map_err(|e| {
            error!(error = %e, "ingestion task did not complete");
            GuardianError::Storage {
                reason: format!("ingestion task failed: {e}"),
            }
        })??;

    Ok(Json(json!({ "ok": true, "event_id": finalized.event_id() })))
}
