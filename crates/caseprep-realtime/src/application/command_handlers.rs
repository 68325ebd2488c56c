//! Command handlers for the realtime session context.

use caseprep_core::auth::Authorizer;
use caseprep_core::clock::Clock;
use caseprep_core::command::Command;
use caseprep_core::error::DomainError;
use caseprep_interview::domain::repository::{InterviewRepository, TemplateRepository};
use tracing::info;

use super::issuer::CredentialIssuer;
use crate::domain::commands::IssueSessionCredential;
use crate::domain::session::SessionCredential;

/// Handles the `IssueSessionCredential` command: loads the interview and its
/// template and delegates to the issuer. Progress is only read.
///
/// # Errors
///
/// Returns `DomainError::InterviewNotFound` or `DomainError::TemplateNotFound`
/// for missing records, and any error from [`CredentialIssuer::issue`].
pub async fn handle_issue_session_credential(
    command: &IssueSessionCredential,
    clock: &dyn Clock,
    authorizer: &dyn Authorizer,
    issuer: &CredentialIssuer,
    interviews: &dyn InterviewRepository,
    templates: &dyn TemplateRepository,
) -> Result<SessionCredential, DomainError> {
    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        interview_id = %command.interview_id,
        question_number = command.question_number,
        "handling issue_session_credential command"
    );

    let interview = interviews.get_interview(command.interview_id).await?;
    let template = templates.get_template(interview.template_id).await?;

    issuer
        .issue(
            &interview,
            &template,
            command.question_number,
            command.ttl,
            command.requester(),
            authorizer,
            clock,
        )
        .await
}
