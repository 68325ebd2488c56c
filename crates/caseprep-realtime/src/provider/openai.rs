//! OpenAI realtime sessions over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::{ProviderError, RealtimeSessionProvider};
use crate::domain::session::{ProviderSession, SessionRequest};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `POST {base_url}/realtime/sessions` with a bounded per-call timeout.
#[derive(Debug, Clone)]
pub struct OpenAiRealtimeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiRealtimeProvider {
    /// Creates a provider whose every call is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}/realtime/sessions", self.base_url.trim_end_matches('/'))
    }
}

fn classify(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err.without_url().to_string())
    }
}

#[async_trait]
impl RealtimeSessionProvider for OpenAiRealtimeProvider {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn create_session(
        &self,
        api_key: &SecretString,
        request: &SessionRequest,
    ) -> Result<ProviderSession, ProviderError> {
        let response = self
            .client
            .post(self.sessions_url())
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "realtime session request rejected");
            return Err(ProviderError::Status(status.as_u16()));
        }

        response.json::<ProviderSession>().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Decode(e.without_url().to_string())
            }
        })
    }
}
