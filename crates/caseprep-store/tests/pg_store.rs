//! Integration tests for the PostgreSQL stores. Need a reachable
//! `DATABASE_URL`; run with `cargo test -- --ignored`.

use caseprep_core::error::DomainError;
use caseprep_interview::domain::interview::{Interview, InterviewStatus};
use caseprep_interview::domain::repository::{InterviewRepository, TemplateRepository};
use caseprep_interview::domain::template::LeadType;
use caseprep_store::pg::{PgInterviewStore, PgTemplateStore};
use caseprep_test_support::fixed_now;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_template(pool: &PgPool, questions: usize) -> Uuid {
    let id = Uuid::new_v4();
    let structure = serde_json::json!({
        "questions": (1..=questions)
            .map(|n| serde_json::json!({ "prompt": format!("Question {n}") }))
            .collect::<Vec<_>>()
    });
    sqlx::query(
        "INSERT INTO interview_templates (id, case_type, lead_type, difficulty, prompt, structure) \
         VALUES ($1, 'Market Entry', 'interviewer-led', 'Medium', 'Enter Brazil?', $2)",
    )
    .bind(id)
    .bind(structure)
    .execute(pool)
    .await
    .unwrap();
    id
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_template_round_trips_through_structure_column(pool: PgPool) {
    let id = seed_template(&pool, 4).await;
    let store = PgTemplateStore::new(pool);

    let template = store.get_template(id).await.unwrap();
    let listed = store.list_templates().await.unwrap();

    assert_eq!(template.lead_type, LeadType::InterviewerLed);
    assert_eq!(template.question_count(), 4);
    assert_eq!(listed.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_save_progress_is_compare_and_swap(pool: PgPool) {
    // Arrange
    let template_id = seed_template(&pool, 4).await;
    let store = PgInterviewStore::new(pool);
    let interview = Interview::initialize(Uuid::new_v4(), Uuid::new_v4(), template_id, fixed_now());
    store.create_interview(&interview).await.unwrap();

    let mut first = store.get_interview(interview.id).await.unwrap();
    let mut second = first.clone();
    first.advance(1, 4, fixed_now()).unwrap();
    second.advance(1, 4, fixed_now()).unwrap();

    // Act
    let saved = store.save_progress(&first).await.unwrap();
    let conflict = store.save_progress(&second).await;

    // Assert
    assert_eq!(saved, 1);
    assert!(matches!(
        conflict,
        Err(DomainError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
    let stored = store.get_interview(interview.id).await.unwrap();
    assert_eq!(stored.status, InterviewStatus::InProgress);
    assert_eq!(stored.progress.current_question, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_create_and_missing_interview(pool: PgPool) {
    let template_id = seed_template(&pool, 1).await;
    let store = PgInterviewStore::new(pool);
    let interview = Interview::initialize(Uuid::new_v4(), Uuid::new_v4(), template_id, fixed_now());
    store.create_interview(&interview).await.unwrap();

    let duplicate = store.create_interview(&interview).await;
    let missing = store.get_interview(Uuid::new_v4()).await;

    assert!(matches!(duplicate, Err(DomainError::InterviewAlreadyExists(_))));
    assert!(matches!(missing, Err(DomainError::InterviewNotFound(_))));
}
