//! Provider-delegated relay credentials from Twilio Network Traversal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use caseprep_core::clock::Clock;
use caseprep_core::error::DomainError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::credential::{RelayCredential, RelayCredentialSource, validate_scope, validate_ttl};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    username: String,
    password: String,
    #[serde(default)]
    ice_servers: Vec<IceServerEntry>,
}

#[derive(Debug, Deserialize)]
struct IceServerEntry {
    #[serde(default)]
    urls: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Requests relay credentials from Twilio's token endpoint.
pub struct TwilioRelaySource {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TwilioRelaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioRelaySource")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .finish_non_exhaustive()
    }
}

impl TwilioRelaySource {
    /// Creates a source whose every call is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: SecretString,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("relay http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token,
            clock,
        })
    }

    fn tokens_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Tokens.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    async fn request_token(&self, ttl: u32) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(self.tokens_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("Ttl", ttl.to_string())])
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status.as_u16()));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| e.without_url().to_string())
    }
}

#[async_trait]
impl RelayCredentialSource for TwilioRelaySource {
    fn name(&self) -> &'static str {
        "twilio"
    }

    #[instrument(skip(self))]
    async fn issue(&self, scope: &str, ttl: u32) -> Result<RelayCredential, DomainError> {
        validate_scope(scope)?;
        let ttl = validate_ttl(ttl)?;
        let issued_at = self.clock.now_unix();

        let token = self.request_token(ttl).await.map_err(|reason| {
            warn!(reason = %reason, "relay token request failed");
            DomainError::UpstreamUnavailable { attempts: 1 }
        })?;

        let urls = token
            .ice_servers
            .into_iter()
            .filter_map(|server| server.urls.or(server.url))
            .collect();

        Ok(RelayCredential {
            username: token.username,
            credential: token.password,
            ttl,
            expiration: issued_at + i64::from(ttl),
            urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use caseprep_test_support::FixedClock;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/2010-04-01")
    }

    async fn tokens(
        Path(account): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if account != "AC123" || !headers.contains_key("authorization") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Authenticate"})));
        }
        (
            StatusCode::CREATED,
            Json(json!({
                "username": "twilio-user",
                "password": "twilio-pass",
                "ttl": form.get("Ttl").cloned().unwrap_or_default(),
                "ice_servers": [
                    {
                        "url": "stun:global.stun.twilio.com:3478",
                        "urls": "stun:global.stun.twilio.com:3478"
                    },
                    {
                        "urls": "turn:global.turn.twilio.com:3478?transport=udp",
                        "username": "twilio-user",
                        "credential": "twilio-pass"
                    }
                ]
            })),
        )
    }

    fn router() -> Router {
        Router::new().route("/2010-04-01/Accounts/{account}/Tokens.json", post(tokens))
    }

    fn source(base: String, sid: &str) -> TwilioRelaySource {
        TwilioRelaySource::new(
            base,
            sid,
            SecretString::from("token"),
            Duration::from_secs(5),
            Arc::new(FixedClock::at_default()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issue_maps_ice_servers_to_urls() {
        // Arrange
        let base = serve(router()).await;
        let source = source(base, "AC123");
        let now = FixedClock::at_default().now_unix();

        // Act
        let credential = source.issue("user-1", 3600).await.unwrap();

        // Assert
        assert_eq!(credential.username, "twilio-user");
        assert_eq!(credential.credential, "twilio-pass");
        assert_eq!(credential.ttl, 3600);
        assert_eq!(credential.expiration, now + 3600);
        assert_eq!(
            credential.urls,
            vec![
                "stun:global.stun.twilio.com:3478".to_owned(),
                "turn:global.turn.twilio.com:3478?transport=udp".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_request_is_upstream_unavailable() {
        let base = serve(router()).await;
        let source = source(base, "AC999");

        let result = source.issue("user-1", 3600).await;

        assert!(matches!(
            result,
            Err(DomainError::UpstreamUnavailable { attempts: 1 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_ttl_is_rejected_before_network() {
        let source = source("http://127.0.0.1:9/2010-04-01".to_owned(), "AC123");

        let result = source.issue("user-1", 10).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
