//! The relay credential and the source seam.

use std::fmt;

use async_trait::async_trait;
use caseprep_core::error::DomainError;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Shortest relay credential lifetime, in seconds.
pub const MIN_RELAY_TTL_SECS: u32 = 300;
/// Longest relay credential lifetime, in seconds.
pub const MAX_RELAY_TTL_SECS: u32 = 604_800;
/// Lifetime used when the caller does not ask for one.
pub const DEFAULT_RELAY_TTL_SECS: u32 = 86_400;

/// A time-boxed relay secret and the endpoints it unlocks.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayCredential {
    /// Relay username.
    pub username: String,
    /// Relay secret.
    pub credential: String,
    /// Lifetime in seconds.
    pub ttl: u32,
    /// Expiry, Unix seconds.
    pub expiration: i64,
    /// Relay and STUN endpoint URLs.
    pub urls: Vec<String>,
}

impl RelayCredential {
    /// Valid strictly before `expiration`.
    #[must_use]
    pub fn is_valid_at(&self, now_unix: i64) -> bool {
        now_unix < self.expiration
    }
}

impl fmt::Debug for RelayCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCredential")
            .field("username", &self.username)
            .field("credential", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("expiration", &self.expiration)
            .field("urls", &self.urls)
            .finish()
    }
}

/// One entry of a WebRTC `iceServers` list.
struct IceServer<'a> {
    urls: &'a [String],
    username: &'a str,
    credential: &'a str,
}

impl Serialize for IceServer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IceServer", 3)?;
        state.serialize_field("urls", self.urls)?;
        state.serialize_field("username", self.username)?;
        state.serialize_field("credential", self.credential)?;
        state.end()
    }
}

/// Serializes as `{username, password, credential, ttl, expiration, urls,
/// ice_servers}`; `password` and `credential` carry the same secret.
impl Serialize for RelayCredential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RelayCredential", 7)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("password", &self.credential)?;
        state.serialize_field("credential", &self.credential)?;
        state.serialize_field("ttl", &self.ttl)?;
        state.serialize_field("expiration", &self.expiration)?;
        state.serialize_field("urls", &self.urls)?;
        state.serialize_field(
            "ice_servers",
            &[IceServer {
                urls: &self.urls,
                username: &self.username,
                credential: &self.credential,
            }],
        )?;
        state.end()
    }
}

/// Rejects a ttl outside `[MIN_RELAY_TTL_SECS, MAX_RELAY_TTL_SECS]`.
///
/// # Errors
///
/// Returns `DomainError::Validation` when out of range.
pub fn validate_ttl(ttl: u32) -> Result<u32, DomainError> {
    if (MIN_RELAY_TTL_SECS..=MAX_RELAY_TTL_SECS).contains(&ttl) {
        Ok(ttl)
    } else {
        Err(DomainError::Validation(format!(
            "relay ttl must be between {MIN_RELAY_TTL_SECS} and {MAX_RELAY_TTL_SECS} seconds, got {ttl}"
        )))
    }
}

/// Rejects an empty scope.
///
/// # Errors
///
/// Returns `DomainError::Validation` when `scope` is blank.
pub fn validate_scope(scope: &str) -> Result<&str, DomainError> {
    let scope = scope.trim();
    if scope.is_empty() {
        Err(DomainError::Validation(
            "relay scope must not be empty".to_owned(),
        ))
    } else {
        Ok(scope)
    }
}

/// Issues relay credentials for a scope.
#[async_trait]
pub trait RelayCredentialSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Issues a credential for `scope` valid for `ttl` seconds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank scope or out-of-range
    /// ttl, and `DomainError::UpstreamUnavailable` when a provider fails.
    async fn issue(&self, scope: &str, ttl: u32) -> Result<RelayCredential, DomainError>;
}
