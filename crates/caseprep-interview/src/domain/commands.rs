//! Commands for the Interview & Progress context.

use caseprep_core::auth::Requester;
use caseprep_core::command::Command;
use uuid::Uuid;

/// Command to start a new interview of a template for the requester.
#[derive(Debug, Clone)]
pub struct StartInterview {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who the interview is started for; becomes its owner.
    pub requester: Requester,
    /// The template to run.
    pub template_id: Uuid,
}

impl Command for StartInterview {
    fn command_type(&self) -> &'static str {
        "interview.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn requester(&self) -> &Requester {
        &self.requester
    }
}

/// Command to mark the current question complete and advance.
#[derive(Debug, Clone)]
pub struct CompleteQuestion {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who is completing the question.
    pub requester: Requester,
    /// The interview being advanced.
    pub interview_id: Uuid,
    /// The question being completed; must equal the current question.
    pub question_number: u32,
}

impl Command for CompleteQuestion {
    fn command_type(&self) -> &'static str {
        "interview.complete_question"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn requester(&self) -> &Requester {
        &self.requester
    }
}

/// Command to restore an interview to its initial progress.
#[derive(Debug, Clone)]
pub struct ResetProgress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who is resetting.
    pub requester: Requester,
    /// The interview to reset.
    pub interview_id: Uuid,
}

impl Command for ResetProgress {
    fn command_type(&self) -> &'static str {
        "interview.reset_progress"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn requester(&self) -> &Requester {
        &self.requester
    }
}
