//! Interview templates.
//!
//! Templates are owned by the content-management layer; this service only
//! reads them. The number of questions is a property of each template and is
//! never assumed.

use caseprep_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who drives the conversation during a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadType {
    /// The interviewer steers the candidate through each step.
    #[serde(alias = "Interviewer-led", alias = "interviewer_led")]
    InterviewerLed,
    /// The candidate drives; the interviewer mostly responds.
    #[serde(alias = "Candidate-led", alias = "candidate_led")]
    CandidateLed,
}

/// One question of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Short label shown to the candidate (e.g. "Opening").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// What the interviewer asks or reads out.
    pub prompt: String,
    /// Facts and expectations available only to the interviewer.
    #[serde(default)]
    pub evaluator_context: String,
}

/// An ordered set of question specs plus case metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier.
    pub id: Uuid,
    /// Case category, e.g. "Market Entry".
    pub case_type: String,
    /// Interviewer-led or candidate-led.
    pub lead_type: LeadType,
    /// Difficulty label, e.g. "Medium".
    pub difficulty: String,
    /// Firm the interviewer represents, if any.
    #[serde(default)]
    pub company: Option<String>,
    /// Industry the case is set in, if any.
    #[serde(default)]
    pub industry: Option<String>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// The main case prompt.
    pub prompt: String,
    /// Questions in the order they must be completed.
    pub questions: Vec<QuestionSpec>,
}

impl Template {
    /// Number of questions `N` in this template.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    /// Returns the 1-based question `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuestion` if `number` is outside `[1, N]`.
    pub fn question(&self, number: u32) -> Result<&QuestionSpec, DomainError> {
        let out_of_range = || DomainError::InvalidQuestion {
            question_number: number,
            reason: format!(
                "template {} has questions 1..={}",
                self.id,
                self.question_count()
            ),
        };
        let index = usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(out_of_range)?;
        self.questions.get(index).ok_or_else(out_of_range)
    }

    /// Checks the structural invariants the rest of the system relies on.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the template has no questions or a
    /// question with an empty prompt.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.questions.is_empty() {
            return Err(DomainError::Validation(format!(
                "template {} has no questions",
                self.id
            )));
        }
        if let Some(position) = self.questions.iter().position(|q| q.prompt.trim().is_empty()) {
            return Err(DomainError::Validation(format!(
                "template {} question {} has an empty prompt",
                self.id,
                position + 1
            )));
        }
        Ok(())
    }

    /// Returns the listing view of this template.
    #[must_use]
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id,
            case_type: self.case_type.clone(),
            lead_type: self.lead_type,
            difficulty: self.difficulty.clone(),
            company: self.company.clone(),
            industry: self.industry.clone(),
            title: self.title.clone(),
            question_count: self.question_count(),
        }
    }
}

/// Listing view of a template, without question content.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    /// Template identifier.
    pub id: Uuid,
    /// Case category.
    pub case_type: String,
    /// Interviewer-led or candidate-led.
    pub lead_type: LeadType,
    /// Difficulty label.
    pub difficulty: String,
    /// Firm, if any.
    pub company: Option<String>,
    /// Industry, if any.
    pub industry: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Number of questions.
    pub question_count: u32,
}
