//! Try a primary source, fall back to a secondary one.

use std::sync::Arc;

use async_trait::async_trait;
use caseprep_core::error::DomainError;
use tracing::warn;

use crate::credential::{RelayCredential, RelayCredentialSource};

/// Chains two sources. Validation errors from the primary are returned as-is;
/// any other failure falls through to the fallback.
pub struct FailoverRelaySource {
    primary: Arc<dyn RelayCredentialSource>,
    fallback: Arc<dyn RelayCredentialSource>,
}

impl FailoverRelaySource {
    /// Creates the chain.
    #[must_use]
    pub fn new(
        primary: Arc<dyn RelayCredentialSource>,
        fallback: Arc<dyn RelayCredentialSource>,
    ) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl RelayCredentialSource for FailoverRelaySource {
    fn name(&self) -> &'static str {
        "failover"
    }

    async fn issue(&self, scope: &str, ttl: u32) -> Result<RelayCredential, DomainError> {
        match self.primary.issue(scope, ttl).await {
            Ok(credential) => Ok(credential),
            Err(DomainError::Validation(reason)) => Err(DomainError::Validation(reason)),
            Err(error) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %error,
                    "relay source failed; using fallback"
                );
                self.fallback.issue(scope, ttl).await
            }
        }
    }
}
