//! Authenticated interview routes.
//!
//! The requester comes from upstream-auth headers; ownership and role are
//! checked by the injected authorizers inside the handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use caseprep_interview::application::command_handlers;
use caseprep_interview::application::query_handlers::{self, InterviewView};
use caseprep_interview::domain::commands;
use caseprep_realtime::application::command_handlers::handle_issue_session_credential;
use caseprep_realtime::domain::commands::IssueSessionCredential;
use caseprep_realtime::domain::session::{DEFAULT_SESSION_TTL_SECS, SessionCredential};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::optional_json;
use crate::error::ApiError;
use crate::extract::{AuthenticatedRequester, JsonBody};
use crate::state::AppState;

/// Request body for POST /interviews.
#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// The template to run.
    pub template_id: Uuid,
}

/// Request body for POST /interviews/{id}/complete-question.
#[derive(Debug, Deserialize)]
pub struct CompleteQuestionRequest {
    /// The question being completed.
    pub question_number: u32,
}

/// Optional request body for POST /interviews/{id}/questions/{n}/token.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    /// Requested credential lifetime in seconds.
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// POST /interviews
#[instrument(skip(state, request), fields(template_id = %request.template_id))]
async fn start_interview(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    JsonBody(request): JsonBody<StartInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewView>), ApiError> {
    let command = commands::StartInterview {
        correlation_id: Uuid::new_v4(),
        requester,
        template_id: request.template_id,
    };

    let interview = command_handlers::handle_start_interview(
        &command,
        state.clock.as_ref(),
        state.templates.as_ref(),
        state.interviews.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(InterviewView::from(&interview))))
}

/// GET /interviews/{id}/progress
#[instrument(skip(state))]
async fn get_progress(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewView>, ApiError> {
    let view = query_handlers::get_interview_progress(
        interview_id,
        &requester,
        state.authorizer.as_ref(),
        state.interviews.as_ref(),
    )
    .await?;
    Ok(Json(view))
}

/// POST /interviews/{id}/questions/{n}/token
#[instrument(skip(state, body))]
async fn issue_token(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    Path((interview_id, question_number)): Path<(Uuid, u32)>,
    body: Bytes,
) -> Result<Json<SessionCredential>, ApiError> {
    let request: TokenRequest = optional_json(&body)?;
    let command = IssueSessionCredential {
        correlation_id: Uuid::new_v4(),
        requester,
        interview_id,
        question_number,
        ttl: request.ttl.unwrap_or(DEFAULT_SESSION_TTL_SECS),
    };

    let credential = handle_issue_session_credential(
        &command,
        state.clock.as_ref(),
        state.authorizer.as_ref(),
        &state.issuer,
        state.interviews.as_ref(),
        state.templates.as_ref(),
    )
    .await?;
    Ok(Json(credential))
}

/// POST /interviews/{id}/complete-question
#[instrument(skip(state, request), fields(question_number = request.question_number))]
async fn complete_question(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    Path(interview_id): Path<Uuid>,
    JsonBody(request): JsonBody<CompleteQuestionRequest>,
) -> Result<Json<InterviewView>, ApiError> {
    let command = commands::CompleteQuestion {
        correlation_id: Uuid::new_v4(),
        requester,
        interview_id,
        question_number: request.question_number,
    };

    let interview = command_handlers::handle_complete_question(
        &command,
        state.clock.as_ref(),
        state.authorizer.as_ref(),
        state.interviews.as_ref(),
        state.templates.as_ref(),
    )
    .await?;
    Ok(Json(InterviewView::from(&interview)))
}

/// POST /interviews/{id}/reset
#[instrument(skip(state))]
async fn reset_progress(
    State(state): State<AppState>,
    AuthenticatedRequester(requester): AuthenticatedRequester,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewView>, ApiError> {
    let command = commands::ResetProgress {
        correlation_id: Uuid::new_v4(),
        requester,
        interview_id,
    };

    let interview = command_handlers::handle_reset_progress(
        &command,
        state.clock.as_ref(),
        state.reset_authorizer.as_ref(),
        state.interviews.as_ref(),
    )
    .await?;
    Ok(Json(InterviewView::from(&interview)))
}

/// Returns the router for authenticated interview operations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/interviews", post(start_interview))
        .route("/interviews/{interview_id}/progress", get(get_progress))
        .route(
            "/interviews/{interview_id}/questions/{question_number}/token",
            post(issue_token),
        )
        .route(
            "/interviews/{interview_id}/complete-question",
            post(complete_question),
        )
        .route("/interviews/{interview_id}/reset", post(reset_progress))
}
