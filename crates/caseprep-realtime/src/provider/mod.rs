//! Realtime session provider seam.
//!
//! The issuer only sees [`RealtimeSessionProvider`]; the OpenAI client and
//! test fakes sit behind it.

pub mod openai;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::session::{ProviderSession, SessionRequest};

/// A failed provider call. Never carries the provider's response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded its timeout.
    #[error("provider call timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("provider responded with status {0}")]
    Status(u16),

    /// The success response could not be decoded.
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether the issuer should fail over to the next key.
    ///
    /// Transport errors, timeouts, rejected keys (401), rate limiting (429)
    /// and server errors (5xx) fail over; anything else does not.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status(status) => matches!(status, 401 | 429 | 500..=599),
            Self::Decode(_) => false,
        }
    }
}

/// Creates ephemeral realtime sessions.
#[async_trait]
pub trait RealtimeSessionProvider: Send + Sync {
    /// Creates a session with `request`, authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns a `ProviderError` describing why the call failed.
    async fn create_session(
        &self,
        api_key: &SecretString,
        request: &SessionRequest,
    ) -> Result<ProviderSession, ProviderError>;
}
