//! Liveness and wiring summary.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Keys in the realtime provider pool.
    pub realtime_keys: usize,
    /// Active relay credential source, if any.
    pub relay_source: Option<&'static str>,
    /// Whether the demo surface is mounted.
    pub demo_enabled: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        realtime_keys: state.issuer.pool().len(),
        relay_source: state.relay.as_ref().map(|relay| relay.name()),
        demo_enabled: state.demo.is_some(),
    })
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
