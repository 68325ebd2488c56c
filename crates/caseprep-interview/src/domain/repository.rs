//! Persistence gateways consumed by this context.
//!
//! Implementations live in `caseprep-store`. Both gateways are async and
//! object-safe so handlers take them as `&dyn`.

use async_trait::async_trait;
use caseprep_core::error::DomainError;
use uuid::Uuid;

use super::interview::Interview;
use super::template::Template;

/// Repository for interview records.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Loads an interview, with `version` set to the stored version.
    ///
    /// Returns `DomainError::InterviewNotFound` if no such interview exists.
    async fn get_interview(&self, interview_id: Uuid) -> Result<Interview, DomainError>;

    /// Inserts a new interview at version 0.
    ///
    /// Returns `DomainError::InterviewAlreadyExists` if the identifier is
    /// already taken.
    async fn create_interview(&self, interview: &Interview) -> Result<(), DomainError>;

    /// Persists status, progress and timestamps if the stored version still
    /// equals `interview.version`, and returns the new version.
    ///
    /// The compare and the write are one atomic step per interview. Returns
    /// `DomainError::ConcurrencyConflict` if the stored version moved.
    async fn save_progress(&self, interview: &Interview) -> Result<i64, DomainError>;
}

/// Read-only repository for templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Loads a template by identifier.
    ///
    /// Returns `DomainError::TemplateNotFound` if no such template exists.
    async fn get_template(&self, template_id: Uuid) -> Result<Template, DomainError>;

    /// Lists every template.
    async fn list_templates(&self) -> Result<Vec<Template>, DomainError>;
}
