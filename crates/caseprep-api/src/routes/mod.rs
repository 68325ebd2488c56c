//! HTTP route modules, one per surface.

pub mod demo;
pub mod health;
pub mod interviews;
pub mod relay;

use axum::Router;
use axum::body::Bytes;
use caseprep_core::error::DomainError;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(health::router())
        .merge(interviews::router())
        .merge(relay::router());
    if state.demo.is_some() {
        api = api.nest("/demo", demo::router());
    }

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Parses an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, DomainError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| DomainError::Validation(format!("invalid request body: {e}")))
}
