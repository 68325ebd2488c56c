//! The credential issuer.
//!
//! Checks run cheapest first and all of them before the network call:
//! authorization, interview status, question reachability, ttl, template
//! range. Only then is the provider called through the key pool. No lock is
//! held and no interview state is written on this path.

use std::sync::Arc;

use caseprep_core::auth::{Authorizer, Requester, require_capability};
use caseprep_core::clock::Clock;
use caseprep_core::error::DomainError;
use caseprep_interview::domain::interview::Interview;
use caseprep_interview::domain::template::Template;
use chrono::Duration;
use tracing::{info, warn};

use crate::domain::instructions;
use crate::domain::key_pool::KeyPool;
use crate::domain::session::{
    ProviderSession, SessionConfig, SessionCredential, SessionRequest, TtlPolicy,
};
use crate::provider::RealtimeSessionProvider;

/// Issues question-scoped realtime session credentials.
pub struct CredentialIssuer {
    pool: Arc<KeyPool>,
    provider: Arc<dyn RealtimeSessionProvider>,
    config: SessionConfig,
    ttl_policy: TtlPolicy,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("pool_size", &self.pool.len())
            .field("model", &self.config.model)
            .field("ttl_policy", &self.ttl_policy)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    /// Creates an issuer.
    #[must_use]
    pub fn new(
        pool: Arc<KeyPool>,
        provider: Arc<dyn RealtimeSessionProvider>,
        config: SessionConfig,
        ttl_policy: TtlPolicy,
    ) -> Self {
        Self {
            pool,
            provider,
            config,
            ttl_policy,
        }
    }

    /// The key pool this issuer fails over through.
    #[must_use]
    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    /// Issues a credential for `question_number` of `interview`.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` if `authorizer` denies the requester.
    /// - `DomainError::InterviewNotActive` if the interview is completed.
    /// - `DomainError::InvalidQuestion` for question 0, a future question or
    ///   one outside the template.
    /// - `DomainError::Validation` for an out-of-range ttl under
    ///   `TtlPolicy::Reject`.
    /// - `DomainError::UpstreamUnavailable` once every key has failed.
    #[allow(clippy::too_many_arguments)]
    pub async fn issue(
        &self,
        interview: &Interview,
        template: &Template,
        question_number: u32,
        ttl: u32,
        requester: &Requester,
        authorizer: &dyn Authorizer,
        clock: &dyn Clock,
    ) -> Result<SessionCredential, DomainError> {
        require_capability(authorizer, requester, interview.user_id, interview.id)?;
        interview.ensure_question_reachable(question_number)?;
        let ttl = self.ttl_policy.apply(ttl)?;
        let instructions = instructions::compile(template, question_number)?;

        let session = self
            .create_session_with_failover(&self.config.request(instructions))
            .await?;

        info!(
            interview_id = %interview.id,
            user_id = %requester.user_id,
            question_number,
            ttl,
            session_id = %session.id,
            "issued session credential"
        );

        Ok(SessionCredential {
            session,
            interview_id: interview.id,
            user_id: requester.user_id,
            question_number,
            expires_at: clock.now() + Duration::seconds(i64::from(ttl)),
            ttl,
        })
    }

    /// Tries the current key, failing over on retriable errors. Bounded to
    /// one attempt per key in the pool.
    async fn create_session_with_failover(
        &self,
        request: &SessionRequest,
    ) -> Result<ProviderSession, DomainError> {
        let attempts = self.pool.len();
        for attempt in 1..=attempts {
            let (index, key) = self.pool.current();
            match self.provider.create_session(key, request).await {
                Ok(session) => return Ok(session),
                Err(error) if error.is_retriable() => {
                    let next = self.pool.advance(index);
                    warn!(
                        key_index = index,
                        next_key_index = next,
                        attempt,
                        error = %error,
                        "realtime provider call failed; failing over"
                    );
                }
                Err(error) => {
                    warn!(
                        key_index = index,
                        attempt,
                        error = %error,
                        "realtime provider call failed"
                    );
                    return Err(DomainError::UpstreamUnavailable { attempts: attempt });
                }
            }
        }
        Err(DomainError::UpstreamUnavailable { attempts })
    }
}
