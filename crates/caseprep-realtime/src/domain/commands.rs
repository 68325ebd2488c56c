//! Commands for the realtime session context.

use caseprep_core::auth::Requester;
use caseprep_core::command::Command;
use uuid::Uuid;

/// Command to issue a session credential scoped to one question.
#[derive(Debug, Clone)]
pub struct IssueSessionCredential {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who the credential is issued to.
    pub requester: Requester,
    /// The interview the credential is bound to.
    pub interview_id: Uuid,
    /// The question the credential is scoped to.
    pub question_number: u32,
    /// Requested lifetime in seconds.
    pub ttl: u32,
}

impl Command for IssueSessionCredential {
    fn command_type(&self) -> &'static str {
        "realtime.issue_session_credential"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn requester(&self) -> &Requester {
        &self.requester
    }
}
