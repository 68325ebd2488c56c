//! Command handlers for the Interview & Progress context.
//!
//! Each handler loads the interview, authorizes the requester, applies the
//! state-machine transition to an in-memory copy and saves it with a version
//! compare-and-swap. A conflicting save is retried once against freshly
//! loaded state, so a request that lost a race is re-evaluated (and usually
//! rejected) instead of overwriting the winner. Conflicts are never retried
//! beyond that; the caller decides.

use caseprep_core::auth::{Authorizer, require_capability};
use caseprep_core::clock::Clock;
use caseprep_core::command::Command;
use caseprep_core::error::DomainError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::commands::{CompleteQuestion, ResetProgress, StartInterview};
use crate::domain::interview::Interview;
use crate::domain::repository::{InterviewRepository, TemplateRepository};

/// Applies `mutate` and saves, re-reading and re-applying once on a version
/// conflict.
async fn save_with_retry<F>(
    mut interview: Interview,
    repo: &dyn InterviewRepository,
    mut mutate: F,
) -> Result<Interview, DomainError>
where
    F: FnMut(&mut Interview) -> Result<(), DomainError> + Send,
{
    let mut retried = false;
    loop {
        mutate(&mut interview)?;
        match repo.save_progress(&interview).await {
            Ok(version) => {
                interview.version = version;
                return Ok(interview);
            }
            Err(DomainError::ConcurrencyConflict {
                expected, actual, ..
            }) if !retried => {
                warn!(
                    interview_id = %interview.id,
                    expected,
                    actual,
                    "progress save conflicted; re-reading once"
                );
                retried = true;
                interview = repo.get_interview(interview.id).await?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Handles the `StartInterview` command: verifies the template, creates an
/// interview in the initial state owned by the requester, and persists it.
///
/// # Errors
///
/// Returns `DomainError::TemplateNotFound` or `DomainError::Validation` for a
/// missing or malformed template, or any repository error.
pub async fn handle_start_interview(
    command: &StartInterview,
    clock: &dyn Clock,
    templates: &dyn TemplateRepository,
    interviews: &dyn InterviewRepository,
) -> Result<Interview, DomainError> {
    let template = templates.get_template(command.template_id).await?;
    template.validate()?;

    let interview = Interview::initialize(
        Uuid::new_v4(),
        command.requester().user_id,
        template.id,
        clock.now(),
    );
    interviews.create_interview(&interview).await?;

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        interview_id = %interview.id,
        template_id = %template.id,
        "interview started"
    );
    Ok(interview)
}

/// Loads the interview with a well-known identifier, creating it in the
/// initial state if it does not exist yet. Used by the ungated demo surface,
/// whose interviews have fixed identifiers.
///
/// # Errors
///
/// Returns any repository error other than a lost creation race.
pub async fn ensure_interview(
    interview_id: Uuid,
    owner_id: Uuid,
    template_id: Uuid,
    clock: &dyn Clock,
    interviews: &dyn InterviewRepository,
) -> Result<Interview, DomainError> {
    match interviews.get_interview(interview_id).await {
        Ok(interview) => return Ok(interview),
        Err(DomainError::InterviewNotFound(_)) => {}
        Err(err) => return Err(err),
    }

    let interview = Interview::initialize(interview_id, owner_id, template_id, clock.now());
    match interviews.create_interview(&interview).await {
        Ok(()) => {
            info!(%interview_id, "interview initialized");
            Ok(interview)
        }
        // Another request created it first.
        Err(DomainError::InterviewAlreadyExists(_)) => interviews.get_interview(interview_id).await,
        Err(err) => Err(err),
    }
}

/// Handles the `CompleteQuestion` command: authorizes the requester, advances
/// progress by exactly the current question, and persists the result.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if the requester is not authorized,
/// `DomainError::InvalidTransition` if the question is not the current one or
/// the interview is completed, `DomainError::ConcurrencyConflict` if the
/// single retry also conflicts, or any repository error.
pub async fn handle_complete_question(
    command: &CompleteQuestion,
    clock: &dyn Clock,
    authorizer: &dyn Authorizer,
    interviews: &dyn InterviewRepository,
    templates: &dyn TemplateRepository,
) -> Result<Interview, DomainError> {
    let interview = interviews.get_interview(command.interview_id).await?;
    require_capability(
        authorizer,
        command.requester(),
        interview.user_id,
        interview.id,
    )?;
    let total_questions = templates
        .get_template(interview.template_id)
        .await?
        .question_count();
    let now = clock.now();

    let interview = save_with_retry(interview, interviews, |candidate| {
        candidate.advance(command.question_number, total_questions, now)
    })
    .await?;

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        interview_id = %interview.id,
        question_number = command.question_number,
        current_question = interview.progress.current_question,
        status = interview.status.as_str(),
        "question completed"
    );
    Ok(interview)
}

/// Handles the `ResetProgress` command: authorizes the requester and restores
/// the initial progress state.
///
/// Whether reset is allowed at all is decided by the injected authorizer; the
/// authenticated surface passes one that only admits administrators.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if the authorizer denies the requester,
/// or any repository error.
pub async fn handle_reset_progress(
    command: &ResetProgress,
    clock: &dyn Clock,
    authorizer: &dyn Authorizer,
    interviews: &dyn InterviewRepository,
) -> Result<Interview, DomainError> {
    let interview = interviews.get_interview(command.interview_id).await?;
    require_capability(
        authorizer,
        command.requester(),
        interview.user_id,
        interview.id,
    )?;
    let now = clock.now();

    let interview = save_with_retry(interview, interviews, |candidate| {
        candidate.reset(now);
        Ok(())
    })
    .await?;

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        interview_id = %interview.id,
        "progress reset"
    );
    Ok(interview)
}
