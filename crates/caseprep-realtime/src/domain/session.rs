//! Realtime session request, provider payload, and the composite credential
//! returned to clients.

use std::fmt;
use std::str::FromStr;

use caseprep_core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest session credential lifetime, in seconds.
pub const MIN_SESSION_TTL_SECS: u32 = 300;
/// Longest session credential lifetime, in seconds.
pub const MAX_SESSION_TTL_SECS: u32 = 7200;
/// Lifetime used when the caller does not ask for one.
pub const DEFAULT_SESSION_TTL_SECS: u32 = 3600;

/// How a ttl outside `[MIN_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS]` is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlPolicy {
    /// Out-of-range values fail with `DomainError::Validation`.
    #[default]
    Reject,
    /// Out-of-range values are clamped into range.
    Clamp,
}

impl TtlPolicy {
    /// Applies the policy to a requested ttl.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` under `Reject` when `ttl` is out of
    /// range.
    pub fn apply(self, ttl: u32) -> Result<u32, DomainError> {
        let range = MIN_SESSION_TTL_SECS..=MAX_SESSION_TTL_SECS;
        match self {
            _ if range.contains(&ttl) => Ok(ttl),
            Self::Clamp => Ok(ttl.clamp(MIN_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS)),
            Self::Reject => Err(DomainError::Validation(format!(
                "ttl must be between {MIN_SESSION_TTL_SECS} and {MAX_SESSION_TTL_SECS} seconds, got {ttl}"
            ))),
        }
    }
}

impl FromStr for TtlPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            other => Err(DomainError::Validation(format!(
                "unknown ttl policy '{other}', expected 'reject' or 'clamp'"
            ))),
        }
    }
}

/// Voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    /// Detection mode, e.g. `server_vad`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Activation threshold in `[0, 1]`.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Audio retained before detected speech.
    #[serde(default)]
    pub prefix_padding_ms: Option<u32>,
    /// Silence that ends a turn.
    #[serde(default)]
    pub silence_duration_ms: Option<u32>,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_owned(),
            threshold: Some(0.5),
            prefix_padding_ms: Some(300),
            silence_duration_ms: Some(200),
        }
    }
}

/// Input transcription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model.
    pub model: String,
}

/// Response length limit: a token count or the literal `"inf"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxOutputTokens {
    /// A hard limit.
    Limit(u32),
    /// A named limit, `"inf"` in practice.
    Named(String),
}

impl Default for MaxOutputTokens {
    fn default() -> Self {
        Self::Named("inf".to_owned())
    }
}

/// Model configuration shared by every session request.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Realtime model.
    pub model: String,
    /// Output voice.
    pub voice: String,
    /// Enabled modalities.
    pub modalities: Vec<String>,
    /// Client audio format.
    pub input_audio_format: String,
    /// Model audio format.
    pub output_audio_format: String,
    /// Transcription model; `None` disables input transcription.
    pub transcription_model: Option<String>,
    /// Turn detection.
    pub turn_detection: TurnDetection,
    /// Sampling temperature.
    pub temperature: f64,
    /// Response length limit.
    pub max_response_output_tokens: MaxOutputTokens,
    /// Tool selection mode.
    pub tool_choice: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini-realtime-preview".to_owned(),
            voice: "echo".to_owned(),
            modalities: vec!["audio".to_owned(), "text".to_owned()],
            input_audio_format: "pcm16".to_owned(),
            output_audio_format: "pcm16".to_owned(),
            transcription_model: Some("whisper-1".to_owned()),
            turn_detection: TurnDetection::default(),
            temperature: 0.8,
            max_response_output_tokens: MaxOutputTokens::default(),
            tool_choice: "auto".to_owned(),
        }
    }
}

impl SessionConfig {
    /// Builds the provider request body for `instructions`.
    #[must_use]
    pub fn request(&self, instructions: String) -> SessionRequest {
        SessionRequest {
            model: self.model.clone(),
            modalities: self.modalities.clone(),
            instructions,
            voice: self.voice.clone(),
            input_audio_format: self.input_audio_format.clone(),
            output_audio_format: self.output_audio_format.clone(),
            input_audio_transcription: self
                .transcription_model
                .clone()
                .map(|model| InputAudioTranscription { model }),
            turn_detection: self.turn_detection.clone(),
            tools: Vec::new(),
            tool_choice: self.tool_choice.clone(),
            temperature: self.temperature,
            max_response_output_tokens: self.max_response_output_tokens.clone(),
        }
    }
}

/// Body of a session creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Realtime model.
    pub model: String,
    /// Enabled modalities.
    pub modalities: Vec<String>,
    /// Compiled per-question instructions.
    pub instructions: String,
    /// Output voice.
    pub voice: String,
    /// Client audio format.
    pub input_audio_format: String,
    /// Model audio format.
    pub output_audio_format: String,
    /// Input transcription settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Turn detection.
    pub turn_detection: TurnDetection,
    /// Tool definitions; always empty.
    pub tools: Vec<serde_json::Value>,
    /// Tool selection mode.
    pub tool_choice: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Response length limit.
    pub max_response_output_tokens: MaxOutputTokens,
}

/// Ephemeral secret minted by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecret {
    /// The secret a client presents to open the realtime connection.
    pub value: String,
    /// Provider-side expiry, Unix seconds.
    pub expires_at: i64,
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn realtime_session_object() -> String {
    "realtime.session".to_owned()
}

/// Session object returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    /// Provider session identifier.
    pub id: String,
    /// Object kind, `realtime.session`.
    #[serde(default = "realtime_session_object")]
    pub object: String,
    /// Model the session runs.
    pub model: String,
    /// Enabled modalities.
    #[serde(default)]
    pub modalities: Vec<String>,
    /// Instructions the session was created with.
    #[serde(default)]
    pub instructions: String,
    /// Output voice.
    #[serde(default)]
    pub voice: String,
    /// Client audio format.
    #[serde(default)]
    pub input_audio_format: String,
    /// Model audio format.
    #[serde(default)]
    pub output_audio_format: String,
    /// Input transcription settings.
    #[serde(default)]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Turn detection.
    #[serde(default)]
    pub turn_detection: Option<TurnDetection>,
    /// Tool definitions.
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    /// Tool selection mode.
    #[serde(default)]
    pub tool_choice: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Response length limit.
    #[serde(default)]
    pub max_response_output_tokens: MaxOutputTokens,
    /// The ephemeral secret.
    pub client_secret: ClientSecret,
}

/// The composite credential handed to a client: the provider session bound
/// to one question of one interview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCredential {
    /// Provider session fields, flattened.
    #[serde(flatten)]
    pub session: ProviderSession,
    /// The interview this credential belongs to.
    pub interview_id: Uuid,
    /// The requester it was issued to.
    pub user_id: Uuid,
    /// The only question it is scoped to.
    pub question_number: u32,
    /// Local expiry, `issued_at + ttl`.
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds.
    pub ttl: u32,
}
