//! Query handlers for the Interview & Progress context.
//!
//! Queries never mutate state; they load the interview, authorize the
//! requester and return a serializable view.

use caseprep_core::auth::{Authorizer, Requester, require_capability};
use caseprep_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::interview::{Interview, ProgressSnapshot};
use crate::domain::repository::{InterviewRepository, TemplateRepository};
use crate::domain::template::{Template, TemplateSummary};

/// Read-only view of an interview: identity plus the progress contract.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewView {
    /// The interview identifier.
    pub id: Uuid,
    /// The owning participant.
    pub user_id: Uuid,
    /// The template being run.
    pub template_id: Uuid,
    /// Progress fields, flattened into the view.
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
    /// Stored version.
    pub version: i64,
}

impl From<&Interview> for InterviewView {
    fn from(interview: &Interview) -> Self {
        Self {
            id: interview.id,
            user_id: interview.user_id,
            template_id: interview.template_id,
            progress: interview.snapshot(),
            version: interview.version,
        }
    }
}

/// Retrieves the progress view of an interview the requester may access.
///
/// # Errors
///
/// Returns `DomainError::InterviewNotFound` if the interview does not exist
/// and `DomainError::Forbidden` if the requester may not access it.
pub async fn get_interview_progress(
    interview_id: Uuid,
    requester: &Requester,
    authorizer: &dyn Authorizer,
    interviews: &dyn InterviewRepository,
) -> Result<InterviewView, DomainError> {
    let interview = interviews.get_interview(interview_id).await?;
    require_capability(authorizer, requester, interview.user_id, interview.id)?;
    Ok(InterviewView::from(&interview))
}

/// Lists summaries of every template.
///
/// # Errors
///
/// Returns any repository error.
pub async fn list_template_summaries(
    templates: &dyn TemplateRepository,
) -> Result<Vec<TemplateSummary>, DomainError> {
    Ok(templates
        .list_templates()
        .await?
        .iter()
        .map(Template::summary)
        .collect())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use caseprep_core::auth::{OwnershipAuthorizer, Requester};
    use caseprep_core::error::DomainError;
    use caseprep_test_support::fixed_now;
    use uuid::Uuid;

    use super::*;
    use crate::domain::template::{LeadType, QuestionSpec};

    struct OneInterview(Interview);

    #[async_trait]
    impl InterviewRepository for OneInterview {
        async fn get_interview(&self, interview_id: Uuid) -> Result<Interview, DomainError> {
            if interview_id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(DomainError::InterviewNotFound(interview_id))
            }
        }

        async fn create_interview(&self, _interview: &Interview) -> Result<(), DomainError> {
            Ok(())
        }

        async fn save_progress(&self, interview: &Interview) -> Result<i64, DomainError> {
            Ok(interview.version + 1)
        }
    }

    struct TwoTemplates;

    #[async_trait]
    impl TemplateRepository for TwoTemplates {
        async fn get_template(&self, template_id: Uuid) -> Result<Template, DomainError> {
            Err(DomainError::TemplateNotFound(template_id.to_string()))
        }

        async fn list_templates(&self) -> Result<Vec<Template>, DomainError> {
            Ok((1..=2)
                .map(|n| Template {
                    id: Uuid::new_v4(),
                    case_type: format!("Case {n}"),
                    lead_type: LeadType::CandidateLed,
                    difficulty: "Easy".to_owned(),
                    company: None,
                    industry: None,
                    title: None,
                    prompt: "Prompt".to_owned(),
                    questions: vec![QuestionSpec {
                        title: None,
                        prompt: "Only question".to_owned(),
                        evaluator_context: String::new(),
                    }],
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_get_interview_progress_returns_view_for_owner() {
        // Arrange
        let owner = Uuid::new_v4();
        let mut interview =
            Interview::initialize(Uuid::new_v4(), owner, Uuid::new_v4(), fixed_now());
        interview.advance(1, 4, fixed_now()).unwrap();
        interview.version = 1;
        let repo = OneInterview(interview.clone());

        // Act
        let view = get_interview_progress(
            interview.id,
            &Requester::member(owner),
            &OwnershipAuthorizer,
            &repo,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(view.id, interview.id);
        assert_eq!(view.progress.current_question, 2);
        assert_eq!(view.progress.questions_completed, vec![1]);
        assert_eq!(view.version, 1);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["current_question"], 2);
        assert_eq!(json["status"], "in-progress");
    }

    #[tokio::test]
    async fn test_get_interview_progress_returns_not_found() {
        let interview =
            Interview::initialize(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), fixed_now());
        let repo = OneInterview(interview);
        let missing = Uuid::new_v4();

        let result = get_interview_progress(
            missing,
            &Requester::admin(Uuid::new_v4()),
            &OwnershipAuthorizer,
            &repo,
        )
        .await;

        match result.unwrap_err() {
            DomainError::InterviewNotFound(id) => assert_eq!(id, missing),
            other => panic!("expected InterviewNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_template_summaries_includes_question_count() {
        let summaries = list_template_summaries(&TwoTemplates).await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.question_count == 1));
    }
}
