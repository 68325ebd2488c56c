//! The interview aggregate and its progress state machine.
//!
//! States are `in-progress` and `completed`. A fresh interview sits on
//! question 1 with nothing completed. `advance` is the only forward edge and
//! accepts exactly the current question; `reset` returns to the initial state
//! from anywhere. All mutation happens on an in-memory copy; persistence and
//! the per-interview atomicity of check-and-update belong to the repository.

use std::collections::BTreeSet;

use caseprep_core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewStatus {
    /// Questions remain to be completed.
    InProgress,
    /// Every question has been completed.
    Completed,
}

impl InterviewStatus {
    /// The wire spelling used in persisted records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Parses the wire spelling.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` for unknown values, since only
    /// stored records are parsed this way.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Infrastructure(format!(
                "unknown interview status '{other}'"
            ))),
        }
    }
}

/// The current-question pointer and completed-question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// The question the participant is on, in `[1, N + 1]`.
    pub current_question: u32,
    /// Questions already completed, always a subset of `1..current_question`.
    pub questions_completed: BTreeSet<u32>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_question: 1,
            questions_completed: BTreeSet::new(),
        }
    }
}

/// A stateful run of a template by one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interview {
    /// Interview identifier.
    pub id: Uuid,
    /// The participant who owns this interview.
    pub user_id: Uuid,
    /// The template being run.
    pub template_id: Uuid,
    /// Lifecycle status.
    pub status: InterviewStatus,
    /// Question progress.
    pub progress: Progress,
    /// When the run (or the last reset) started.
    pub started_at: DateTime<Utc>,
    /// Set exactly when `status` is `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Version observed when this copy was loaded; the repository compares
    /// it on save.
    pub version: i64,
}

/// Read-only view of an interview's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// The current question.
    pub current_question: u32,
    /// Completed questions in ascending order.
    pub questions_completed: Vec<u32>,
    /// Lifecycle status.
    pub status: InterviewStatus,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run completed, if it has.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Interview {
    /// Creates an interview in the initial state: in progress, on question 1,
    /// nothing completed.
    #[must_use]
    pub fn initialize(id: Uuid, user_id: Uuid, template_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            template_id,
            status: InterviewStatus::InProgress,
            progress: Progress::default(),
            started_at: now,
            completed_at: None,
            version: 0,
        }
    }

    /// Marks `completed_question` done and moves to the next question.
    ///
    /// Succeeds only while in progress and only for the current question.
    /// Completing the last of `total_questions` moves the interview to
    /// `Completed` and stamps `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` (leaving state untouched) if
    /// the interview is completed, the question is not the current one, or it
    /// was already completed.
    pub fn advance(
        &mut self,
        completed_question: u32,
        total_questions: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != InterviewStatus::InProgress {
            return Err(self.invalid_transition("interview is already completed".to_owned()));
        }
        if completed_question != self.progress.current_question {
            return Err(self.invalid_transition(format!(
                "can only complete the current question {}, got {completed_question}",
                self.progress.current_question
            )));
        }
        if self.progress.questions_completed.contains(&completed_question) {
            return Err(
                self.invalid_transition(format!("question {completed_question} already completed"))
            );
        }

        self.progress.questions_completed.insert(completed_question);
        self.progress.current_question =
            completed_question.saturating_add(1).min(total_questions.saturating_add(1));

        if (1..=total_questions).all(|q| self.progress.questions_completed.contains(&q)) {
            self.status = InterviewStatus::Completed;
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Unconditionally restores the initial state and clears `completed_at`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.status = InterviewStatus::InProgress;
        self.progress = Progress::default();
        self.started_at = now;
        self.completed_at = None;
    }

    /// Checks that a credential may be issued for `question_number`: the
    /// interview must be in progress and the question must be the current one
    /// or one already passed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InterviewNotActive` if completed, or
    /// `DomainError::InvalidQuestion` for question 0 or a future question.
    pub fn ensure_question_reachable(&self, question_number: u32) -> Result<(), DomainError> {
        if self.status != InterviewStatus::InProgress {
            return Err(DomainError::InterviewNotActive(self.id));
        }
        if question_number < 1 {
            return Err(DomainError::InvalidQuestion {
                question_number,
                reason: "question numbers start at 1".to_owned(),
            });
        }
        if question_number > self.progress.current_question {
            return Err(DomainError::InvalidQuestion {
                question_number,
                reason: format!(
                    "cannot access future questions; current question is {}",
                    self.progress.current_question
                ),
            });
        }
        Ok(())
    }

    /// Returns a side-effect-free view of the progress.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current_question: self.progress.current_question,
            questions_completed: self.progress.questions_completed.iter().copied().collect(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    fn invalid_transition(&self, reason: String) -> DomainError {
        DomainError::InvalidTransition {
            interview_id: self.id,
            reason,
        }
    }
}
