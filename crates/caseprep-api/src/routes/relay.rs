//! Authenticated relay credential route.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use caseprep_core::error::DomainError;
use caseprep_relay::RelayCredential;
use caseprep_relay::RelayCredentialSource;
use caseprep_relay::credential::DEFAULT_RELAY_TTL_SECS;
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::extract::AuthenticatedRequester;
use crate::state::AppState;

/// Query parameters for relay credential requests.
#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    /// Requested lifetime in seconds.
    pub ttl: Option<u32>,
}

/// The configured relay source, or `UpstreamUnavailable` when there is none.
pub(crate) fn relay_source(
    state: &AppState,
) -> Result<Arc<dyn RelayCredentialSource>, DomainError> {
    state
        .relay
        .clone()
        .ok_or(DomainError::UpstreamUnavailable { attempts: 0 })
}

/// GET /relay/credentials
#[instrument(skip(state, requester))]
async fn relay_credentials(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    Query(query): Query<RelayQuery>,
) -> Result<Json<RelayCredential>, ApiError> {
    let credential = relay_source(&state)?
        .issue(
            &requester.user_id.to_string(),
            query.ttl.unwrap_or(DEFAULT_RELAY_TTL_SECS),
        )
        .await?;
    Ok(Json(credential))
}

/// Returns the router for relay credentials.
pub fn router() -> Router<AppState> {
    Router::new().route("/relay/credentials", get(relay_credentials))
}
