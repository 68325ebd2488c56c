//! `PostgreSQL` stores.
//!
//! `save_progress` is a single conditional `UPDATE ... WHERE version = $n`,
//! so the compare-and-swap is atomic in the database and no row lock is held
//! between requests.

use async_trait::async_trait;
use caseprep_core::error::DomainError;
use caseprep_interview::domain::interview::{Interview, InterviewStatus, Progress};
use caseprep_interview::domain::repository::{InterviewRepository, TemplateRepository};
use caseprep_interview::domain::template::{LeadType, QuestionSpec, Template};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

/// Row shape of the `interviews` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InterviewRow {
    id: Uuid,
    user_id: Uuid,
    template_id: Uuid,
    status: String,
    current_question: i32,
    questions_completed: Vec<i32>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    version: i64,
}

fn to_u32(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::Infrastructure(format!("negative value {value} in column {column}"))
    })
}

fn to_i32(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("question number {value} overflows")))
}

impl TryFrom<InterviewRow> for Interview {
    type Error = DomainError;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        let questions_completed = row
            .questions_completed
            .into_iter()
            .map(|q| to_u32(q, "questions_completed"))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            template_id: row.template_id,
            status: InterviewStatus::parse(&row.status)?,
            progress: Progress {
                current_question: to_u32(row.current_question, "current_question")?,
                questions_completed,
            },
            started_at: row.started_at,
            completed_at: row.completed_at,
            version: row.version,
        })
    }
}

fn completed_column(interview: &Interview) -> Result<Vec<i32>, DomainError> {
    interview
        .progress
        .questions_completed
        .iter()
        .map(|q| to_i32(*q))
        .collect()
}

/// PostgreSQL-backed interview store.
#[derive(Debug, Clone)]
pub struct PgInterviewStore {
    pool: PgPool,
}

impl PgInterviewStore {
    /// Creates a new `PgInterviewStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewRepository for PgInterviewStore {
    async fn get_interview(&self, interview_id: Uuid) -> Result<Interview, DomainError> {
        let row = sqlx::query_as::<_, InterviewRow>(
            "SELECT id, user_id, template_id, status, current_question, questions_completed, \
             started_at, completed_at, version FROM interviews WHERE id = $1",
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?
        .ok_or(DomainError::InterviewNotFound(interview_id))?;
        Interview::try_from(row)
    }

    async fn create_interview(&self, interview: &Interview) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO interviews (id, user_id, template_id, status, current_question, \
             questions_completed, started_at, completed_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0) ON CONFLICT (id) DO NOTHING",
        )
        .bind(interview.id)
        .bind(interview.user_id)
        .bind(interview.template_id)
        .bind(interview.status.as_str())
        .bind(to_i32(interview.progress.current_question)?)
        .bind(completed_column(interview)?)
        .bind(interview.started_at)
        .bind(interview.completed_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InterviewAlreadyExists(interview.id));
        }
        Ok(())
    }

    async fn save_progress(&self, interview: &Interview) -> Result<i64, DomainError> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE interviews SET status = $3, current_question = $4, \
             questions_completed = $5, started_at = $6, completed_at = $7, \
             version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING version",
        )
        .bind(interview.id)
        .bind(interview.version)
        .bind(interview.status.as_str())
        .bind(to_i32(interview.progress.current_question)?)
        .bind(completed_column(interview)?)
        .bind(interview.started_at)
        .bind(interview.completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        if let Some(version) = updated {
            return Ok(version);
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM interviews WHERE id = $1")
            .bind(interview.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;
        debug!(
            interview_id = %interview.id,
            expected = interview.version,
            ?actual,
            "conditional update matched no row"
        );
        match actual {
            Some(actual) => Err(DomainError::ConcurrencyConflict {
                interview_id: interview.id,
                expected: interview.version,
                actual,
            }),
            None => Err(DomainError::InterviewNotFound(interview.id)),
        }
    }
}

/// Shape of the `structure` JSONB column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateStructure {
    /// Ordered question specs.
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

/// Row shape of the `interview_templates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TemplateRow {
    id: Uuid,
    case_type: String,
    lead_type: String,
    difficulty: String,
    company: Option<String>,
    industry: Option<String>,
    title: Option<String>,
    prompt: String,
    structure: Json<TemplateStructure>,
}

fn parse_lead_type(value: &str) -> Result<LeadType, DomainError> {
    serde_json::from_value(serde_json::Value::String(value.to_owned()))
        .map_err(|_| DomainError::Infrastructure(format!("unknown lead type '{value}'")))
}

impl TryFrom<TemplateRow> for Template {
    type Error = DomainError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            case_type: row.case_type,
            lead_type: parse_lead_type(&row.lead_type)?,
            difficulty: row.difficulty,
            company: row.company,
            industry: row.industry,
            title: row.title,
            prompt: row.prompt,
            questions: row.structure.0.questions,
        })
    }
}

const TEMPLATE_COLUMNS: &str =
    "id, case_type, lead_type, difficulty, company, industry, title, prompt, structure";

/// PostgreSQL-backed, read-only template store.
#[derive(Debug, Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    /// Creates a new `PgTemplateStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateStore {
    async fn get_template(&self, template_id: Uuid) -> Result<Template, DomainError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM interview_templates WHERE id = $1"
        ))
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?
        .ok_or_else(|| DomainError::TemplateNotFound(template_id.to_string()))?;
        Template::try_from(row)
    }

    async fn list_templates(&self) -> Result<Vec<Template>, DomainError> {
        sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM interview_templates ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?
        .into_iter()
        .map(Template::try_from)
        .collect()
    }
}
