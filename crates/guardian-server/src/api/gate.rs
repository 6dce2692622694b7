//! Governance gate middleware.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use guardian_gate::GOVERNANCE_KEY_HEADER;

use crate::api::error::AppError;
use crate::AppState;

/// Reject the request unless it carries the governance key.
///
/// Runs before the body is read.  The presented value is never logged.
pub async fn require_governance_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(GOVERNANCE_KEY_HEADER)
        .map(|value| value.as_bytes());

    if let Err(err) = state.gate.authorize(presented) {
        // Peer address is only present when served with connect info.
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(peer = %peer, path = %request.uri().path(), "governance key rejected");
        return AppError(err).into_response();
    }

    next.run(request).await
}
