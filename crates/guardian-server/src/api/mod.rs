//! HTTP routes.
//!
//! One route, `POST /api/governance/harm-override`, behind the governance
//! gate middleware.

pub mod error;
pub mod gate;
pub mod harm_override;

use axum::{middleware, routing::post, Router};

use crate::AppState;

/// Path of the ingestion route.
pub const HARM_OVERRIDE_PATH: &str = "/api/governance/harm-override";

/// Build the router for `state`.
///
/// The gate runs as a route layer, so it sees every request to the route
/// before the body is read.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(HARM_OVERRIDE_PATH, post(harm_override::ingest))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_governance_key,
        ))
        .with_state(state)
}
