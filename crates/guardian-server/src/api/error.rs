//! Error responses.
//!
//! Maps `GuardianError` onto status codes and the `{ok:false, ...}` body.
//! Internal detail (paths, hashes, I/O errors) is never sent to the caller;
//! it is logged where the error is raised.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use guardian_contracts::error::GuardianError;

#[derive(Debug)]
pub struct AppError(pub GuardianError);

impl From<GuardianError> for AppError {
    fn from(err: GuardianError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            GuardianError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "ok": false, "error": "invalid key" }),
            ),
            GuardianError::Validation { violations } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "ok": false,
                    "error": "event failed schema validation",
                    "details": violations,
                }),
            ),
            GuardianError::ChainCorruption { .. }
            | GuardianError::Storage { .. }
            | GuardianError::Configuration { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "ok": false, "error": "audit log append failed" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
