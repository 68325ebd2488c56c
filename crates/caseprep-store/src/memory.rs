//! In-process stores.
//!
//! Non-durable: everything is lost on restart. Interviews live behind one
//! mutex each, so the version compare-and-swap in `save_progress` is atomic
//! per interview while different interviews never contend. No lock is held
//! across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use caseprep_core::error::DomainError;
use caseprep_interview::domain::interview::Interview;
use caseprep_interview::domain::repository::{InterviewRepository, TemplateRepository};
use caseprep_interview::domain::template::Template;
use uuid::Uuid;

fn poisoned() -> DomainError {
    DomainError::Infrastructure("in-memory store lock poisoned".to_owned())
}

/// In-memory interview store with per-interview locking.
#[derive(Debug, Default)]
pub struct InMemoryInterviewStore {
    interviews: RwLock<HashMap<Uuid, Arc<Mutex<Interview>>>>,
}

impl InMemoryInterviewStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, interview_id: Uuid) -> Result<Arc<Mutex<Interview>>, DomainError> {
        self.interviews
            .read()
            .map_err(|_| poisoned())?
            .get(&interview_id)
            .cloned()
            .ok_or(DomainError::InterviewNotFound(interview_id))
    }
}

fn lock(entry: &Mutex<Interview>) -> Result<MutexGuard<'_, Interview>, DomainError> {
    entry.lock().map_err(|_| poisoned())
}

#[async_trait]
impl InterviewRepository for InMemoryInterviewStore {
    async fn get_interview(&self, interview_id: Uuid) -> Result<Interview, DomainError> {
        let entry = self.entry(interview_id)?;
        let interview = lock(&entry)?.clone();
        Ok(interview)
    }

    async fn create_interview(&self, interview: &Interview) -> Result<(), DomainError> {
        let mut interviews = self.interviews.write().map_err(|_| poisoned())?;
        if interviews.contains_key(&interview.id) {
            return Err(DomainError::InterviewAlreadyExists(interview.id));
        }
        let mut stored = interview.clone();
        stored.version = 0;
        interviews.insert(interview.id, Arc::new(Mutex::new(stored)));
        Ok(())
    }

    async fn save_progress(&self, interview: &Interview) -> Result<i64, DomainError> {
        let entry = self.entry(interview.id)?;
        let mut stored = lock(&entry)?;
        if stored.version != interview.version {
            return Err(DomainError::ConcurrencyConflict {
                interview_id: interview.id,
                expected: interview.version,
                actual: stored.version,
            });
        }
        let version = stored.version + 1;
        stored.status = interview.status;
        stored.progress = interview.progress.clone();
        stored.started_at = interview.started_at;
        stored.completed_at = interview.completed_at;
        stored.version = version;
        Ok(version)
    }
}

/// In-memory, read-only template catalog.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: Vec<Template>,
}

impl InMemoryTemplateStore {
    /// Builds a catalog, keeping the given order for listings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a template is malformed or an
    /// identifier appears twice.
    pub fn from_templates(templates: Vec<Template>) -> Result<Self, DomainError> {
        for (index, template) in templates.iter().enumerate() {
            template.validate()?;
            if templates[..index].iter().any(|t| t.id == template.id) {
                return Err(DomainError::Validation(format!(
                    "duplicate template id {}",
                    template.id
                )));
            }
        }
        Ok(Self { templates })
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateStore {
    async fn get_template(&self, template_id: Uuid) -> Result<Template, DomainError> {
        self.templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| DomainError::TemplateNotFound(template_id.to_string()))
    }

    async fn list_templates(&self) -> Result<Vec<Template>, DomainError> {
        Ok(self.templates.clone())
    }
}

#[cfg(test)]
mod tests {
    use caseprep_interview::domain::template::{LeadType, QuestionSpec};
    use caseprep_test_support::fixed_now;

    use super::*;

    fn fresh() -> Interview {
        Interview::initialize(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), fixed_now())
    }

    fn template(questions: usize) -> Template {
        Template {
            id: Uuid::new_v4(),
            case_type: "Merger".to_owned(),
            lead_type: LeadType::InterviewerLed,
            difficulty: "Hard".to_owned(),
            company: None,
            industry: None,
            title: None,
            prompt: "Two airlines want to merge.".to_owned(),
            questions: (0..questions)
                .map(|n| QuestionSpec {
                    title: None,
                    prompt: format!("Q{n}"),
                    evaluator_context: String::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_starts_at_version_zero() {
        // Arrange
        let store = InMemoryInterviewStore::new();
        let mut interview = fresh();
        interview.version = 7;

        // Act
        store.create_interview(&interview).await.unwrap();
        let loaded = store.get_interview(interview.id).await.unwrap();

        // Assert
        assert_eq!(loaded.version, 0);
        assert_eq!(loaded.progress.current_question, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = InMemoryInterviewStore::new();
        let interview = fresh();
        store.create_interview(&interview).await.unwrap();

        let result = store.create_interview(&interview).await;

        match result.unwrap_err() {
            DomainError::InterviewAlreadyExists(id) => assert_eq!(id, interview.id),
            other => panic!("expected InterviewAlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_unknown_interview_is_not_found() {
        let store = InMemoryInterviewStore::new();
        let id = Uuid::new_v4();

        let result = store.get_interview(id).await;

        assert!(matches!(result, Err(DomainError::InterviewNotFound(found)) if found == id));
    }

    #[tokio::test]
    async fn test_save_progress_bumps_version() {
        // Arrange
        let store = InMemoryInterviewStore::new();
        let interview = fresh();
        store.create_interview(&interview).await.unwrap();
        let mut loaded = store.get_interview(interview.id).await.unwrap();
        loaded.advance(1, 4, fixed_now()).unwrap();

        // Act
        let version = store.save_progress(&loaded).await.unwrap();

        // Assert
        assert_eq!(version, 1);
        let stored = store.get_interview(interview.id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.progress.current_question, 2);
    }

    #[tokio::test]
    async fn test_save_progress_with_stale_version_conflicts_and_keeps_state() {
        // Arrange
        let store = InMemoryInterviewStore::new();
        let interview = fresh();
        store.create_interview(&interview).await.unwrap();
        let mut first = store.get_interview(interview.id).await.unwrap();
        let mut second = first.clone();
        first.advance(1, 4, fixed_now()).unwrap();
        second.advance(1, 4, fixed_now()).unwrap();
        store.save_progress(&first).await.unwrap();

        // Act
        let result = store.save_progress(&second).await;

        // Assert
        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        let stored = store.get_interview(interview.id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.progress.questions_completed.len(), 1);
    }

    #[tokio::test]
    async fn test_template_store_lists_in_order_and_finds_by_id() {
        let first = template(4);
        let second = template(2);
        let store =
            InMemoryTemplateStore::from_templates(vec![first.clone(), second.clone()]).unwrap();

        let listed = store.list_templates().await.unwrap();
        let found = store.get_template(second.id).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(found.question_count(), 2);
    }

    #[tokio::test]
    async fn test_template_store_rejects_malformed_catalog() {
        let duplicate = template(1);

        assert!(InMemoryTemplateStore::from_templates(vec![template(0)]).is_err());
        assert!(
            InMemoryTemplateStore::from_templates(vec![duplicate.clone(), duplicate]).is_err()
        );
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let store = InMemoryTemplateStore::from_templates(vec![template(1)]).unwrap();

        let result = store.get_template(Uuid::new_v4()).await;

        assert!(matches!(result, Err(DomainError::TemplateNotFound(_))));
    }
}
