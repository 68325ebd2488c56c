//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Variants map one-to-one onto the failure classes callers can act on:
/// validation and authorization failures are raised before any side effect,
/// progress conflicts are recoverable by re-reading state, and
/// `UpstreamUnavailable` is terminal for the request.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input (ttl out of range, bad identifiers, empty key pool).
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable identity was presented.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requester is neither the owner nor an administrator.
    #[error("forbidden: requester {requester} may not access interview {interview_id}")]
    Forbidden {
        /// The requesting user.
        requester: Uuid,
        /// The interview that was requested.
        interview_id: Uuid,
    },

    /// An interview was not found.
    #[error("interview not found: {0}")]
    InterviewNotFound(Uuid),

    /// An interview with this identifier already exists.
    #[error("interview already exists: {0}")]
    InterviewAlreadyExists(Uuid),

    /// A template was not found.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// An illegal progress transition (skipping, re-completing, or advancing
    /// a completed interview).
    #[error("invalid transition on interview {interview_id}: {reason}")]
    InvalidTransition {
        /// The interview whose progress was left unchanged.
        interview_id: Uuid,
        /// Human-readable explanation.
        reason: String,
    },

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on interview {interview_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The interview that had the conflict.
        interview_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// The interview is not in progress.
    #[error("interview {0} is not in progress")]
    InterviewNotActive(Uuid),

    /// The question is in the future or outside the template's range.
    #[error("invalid question {question_number}: {reason}")]
    InvalidQuestion {
        /// The requested question number.
        question_number: u32,
        /// Human-readable explanation.
        reason: String,
    },

    /// Every upstream attempt failed. Carries no provider detail.
    #[error("upstream provider unavailable after {attempts} attempt(s)")]
    UpstreamUnavailable {
        /// Number of attempts made before giving up.
        attempts: usize,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
