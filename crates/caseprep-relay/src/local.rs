//! Local derivation with the TURN REST shared-secret scheme.
//!
//! `username = "<expiration>:<scope>"`,
//! `credential = base64(HMAC-SHA256(shared_secret, username))`. A relay
//! server holding the same secret validates without calling back here.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use caseprep_core::clock::Clock;
use caseprep_core::error::DomainError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::debug;

use crate::credential::{RelayCredential, RelayCredentialSource, validate_scope, validate_ttl};

type HmacSha256 = Hmac<Sha256>;

/// Derives relay credentials locally from a shared secret.
pub struct HmacRelaySource {
    secret: SecretString,
    urls: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for HmacRelaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacRelaySource")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl HmacRelaySource {
    /// Creates a source that hands out `urls`.
    #[must_use]
    pub fn new(secret: SecretString, urls: Vec<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            urls,
            clock,
        }
    }

    fn mac(&self, username: &str) -> Result<HmacSha256, DomainError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| DomainError::Infrastructure(format!("invalid relay secret: {e}")))?;
        mac.update(username.as_bytes());
        Ok(mac)
    }

    /// Derives a credential for `scope` expiring `ttl` seconds from now.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank scope or out-of-range ttl.
    pub fn derive(&self, scope: &str, ttl: u32) -> Result<RelayCredential, DomainError> {
        let scope = validate_scope(scope)?;
        let ttl = validate_ttl(ttl)?;
        let expiration = self.clock.now_unix() + i64::from(ttl);
        let username = format!("{expiration}:{scope}");
        let credential = STANDARD.encode(self.mac(&username)?.finalize().into_bytes());

        debug!(scope, expiration, "derived relay credential");

        Ok(RelayCredential {
            username,
            credential,
            ttl,
            expiration,
            urls: self.urls.clone(),
        })
    }

    /// Checks `credential` the way a relay server sharing the secret would:
    /// the secret must match the username and `now_unix` must be strictly
    /// before the expiration embedded in it.
    #[must_use]
    pub fn verify(&self, credential: &RelayCredential, now_unix: i64) -> bool {
        let Some(expiration) = credential
            .username
            .split_once(':')
            .and_then(|(exp, _)| exp.parse::<i64>().ok())
        else {
            return false;
        };
        let Ok(presented) = STANDARD.decode(&credential.credential) else {
            return false;
        };
        let Ok(mac) = self.mac(&credential.username) else {
            return false;
        };
        mac.verify_slice(&presented).is_ok() && now_unix < expiration
    }
}

#[async_trait]
impl RelayCredentialSource for HmacRelaySource {
    fn name(&self) -> &'static str {
        "hmac"
    }

    async fn issue(&self, scope: &str, ttl: u32) -> Result<RelayCredential, DomainError> {
        self.derive(scope, ttl)
    }
}
