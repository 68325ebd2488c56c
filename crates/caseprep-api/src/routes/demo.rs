//! Ungated demo routes.
//!
//! No identity is required. Every operation acts as the shared demo user on
//! the fixed interview of a case, created lazily on first use.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use caseprep_core::auth::OwnershipAuthorizer;
use caseprep_core::error::DomainError;
use caseprep_interview::application::command_handlers::{
    ensure_interview, handle_complete_question, handle_reset_progress,
};
use caseprep_interview::application::query_handlers::{InterviewView, list_template_summaries};
use caseprep_interview::domain::commands::{CompleteQuestion, ResetProgress};
use caseprep_interview::domain::interview::Interview;
use caseprep_interview::domain::repository::TemplateRepository;
use caseprep_interview::domain::template::{Template, TemplateSummary};
use caseprep_realtime::application::command_handlers::handle_issue_session_credential;
use caseprep_realtime::domain::commands::IssueSessionCredential;
use caseprep_realtime::domain::session::{DEFAULT_SESSION_TTL_SECS, SessionCredential};
use caseprep_relay::RelayCredential;
use caseprep_relay::credential::DEFAULT_RELAY_TTL_SECS;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::relay::relay_source;
use crate::demo::DemoCatalog;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

/// Query parameters carrying an optional ttl.
#[derive(Debug, Deserialize)]
pub struct TtlQuery {
    /// Requested lifetime in seconds.
    pub ttl: Option<u32>,
}

/// Request body for POST /interviews/complete-question.
#[derive(Debug, Deserialize)]
pub struct DemoCompleteRequest {
    /// Demo case slug.
    pub case_type: String,
    /// The question being completed.
    pub question_number: u32,
}

/// A demo interview with its case slug.
#[derive(Debug, Serialize)]
pub struct DemoInterviewResponse {
    /// Demo case slug.
    pub case_type: String,
    /// Interview identity and progress.
    #[serde(flatten)]
    pub interview: InterviewView,
}

fn catalog(state: &AppState) -> Result<Arc<DemoCatalog>, DomainError> {
    state
        .demo
        .clone()
        .ok_or_else(|| DomainError::TemplateNotFound("demo catalog".to_owned()))
}

async fn demo_interview(
    state: &AppState,
    catalog: &DemoCatalog,
    case_type: &str,
) -> Result<Interview, DomainError> {
    let case = catalog.case(case_type)?;
    ensure_interview(
        case.interview_id,
        catalog.requester().user_id,
        case.template_id,
        state.clock.as_ref(),
        catalog.interviews.as_ref(),
    )
    .await
}

fn respond(case_type: String, interview: &Interview) -> Json<DemoInterviewResponse> {
    Json(DemoInterviewResponse {
        case_type,
        interview: InterviewView::from(interview),
    })
}

/// GET /templates
async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateSummary>>, ApiError> {
    let catalog = catalog(&state)?;
    Ok(Json(
        list_template_summaries(catalog.templates.as_ref()).await?,
    ))
}

/// GET /templates/{template_id}
async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<Template>, ApiError> {
    let catalog = catalog(&state)?;
    Ok(Json(catalog.templates.get_template(template_id).await?))
}

/// GET /interviews/{case_type}
#[instrument(skip(state))]
async fn get_interview(
    State(state): State<AppState>,
    Path(case_type): Path<String>,
) -> Result<Json<DemoInterviewResponse>, ApiError> {
    let catalog = catalog(&state)?;
    let interview = demo_interview(&state, &catalog, &case_type).await?;
    Ok(respond(case_type, &interview))
}

/// GET /interviews/{case_type}/questions/{n}/token
#[instrument(skip(state))]
async fn issue_token(
    State(state): State<AppState>,
    Path((case_type, question_number)): Path<(String, u32)>,
    Query(query): Query<TtlQuery>,
) -> Result<Json<SessionCredential>, ApiError> {
    let catalog = catalog(&state)?;
    let interview = demo_interview(&state, &catalog, &case_type).await?;
    let command = IssueSessionCredential {
        correlation_id: Uuid::new_v4(),
        requester: catalog.requester(),
        interview_id: interview.id,
        question_number,
        ttl: query.ttl.unwrap_or(DEFAULT_SESSION_TTL_SECS),
    };

    let credential = handle_issue_session_credential(
        &command,
        state.clock.as_ref(),
        &OwnershipAuthorizer,
        &state.issuer,
        catalog.interviews.as_ref(),
        catalog.templates.as_ref(),
    )
    .await?;
    Ok(Json(credential))
}

/// POST /interviews/complete-question
#[instrument(
    skip(state, request),
    fields(case_type = %request.case_type, question_number = request.question_number)
)]
async fn complete_question(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DemoCompleteRequest>,
) -> Result<Json<DemoInterviewResponse>, ApiError> {
    let catalog = catalog(&state)?;
    let interview = demo_interview(&state, &catalog, &request.case_type).await?;
    let command = CompleteQuestion {
        correlation_id: Uuid::new_v4(),
        requester: catalog.requester(),
        interview_id: interview.id,
        question_number: request.question_number,
    };

    let interview = handle_complete_question(
        &command,
        state.clock.as_ref(),
        &OwnershipAuthorizer,
        catalog.interviews.as_ref(),
        catalog.templates.as_ref(),
    )
    .await?;
    Ok(respond(request.case_type, &interview))
}

/// POST /reset/{case_type}
#[instrument(skip(state))]
async fn reset(
    State(state): State<AppState>,
    Path(case_type): Path<String>,
) -> Result<Json<DemoInterviewResponse>, ApiError> {
    let catalog = catalog(&state)?;
    let interview = demo_interview(&state, &catalog, &case_type).await?;
    let command = ResetProgress {
        correlation_id: Uuid::new_v4(),
        requester: catalog.requester(),
        interview_id: interview.id,
    };

    let interview = handle_reset_progress(
        &command,
        state.clock.as_ref(),
        &OwnershipAuthorizer,
        catalog.interviews.as_ref(),
    )
    .await?;
    Ok(respond(case_type, &interview))
}

/// GET /turn-credentials
#[instrument(skip(state))]
async fn turn_credentials(
    State(state): State<AppState>,
    Query(query): Query<TtlQuery>,
) -> Result<Json<RelayCredential>, ApiError> {
    let source = relay_source(&state)?;
    let scope = {
        let mut rng = state
            .rng
            .lock()
            .map_err(|_| DomainError::Infrastructure("rng lock poisoned".to_owned()))?;
        format!("demo-user-{}", rng.hex_token(4))
    };
    info!(scope = %scope, "issuing guest relay credential");

    let credential = source
        .issue(&scope, query.ttl.unwrap_or(DEFAULT_RELAY_TTL_SECS))
        .await?;
    Ok(Json(credential))
}

/// Returns the router for the ungated demo surface.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates))
        .route("/templates/{template_id}", get(get_template))
        .route("/interviews/{case_type}", get(get_interview))
        .route(
            "/interviews/{case_type}/questions/{question_number}/token",
            get(issue_token),
        )
        .route("/interviews/complete-question", post(complete_question))
        .route("/reset/{case_type}", post(reset))
        .route("/turn-credentials", get(turn_credentials))
}
