//! Startup configuration, read once from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use caseprep_realtime::domain::session::{SessionConfig, TtlPolicy};
use caseprep_realtime::provider::openai;
use secrecy::SecretString;

use crate::error::AppError;

/// Relay endpoints handed out when `TURN_URLS` is unset.
pub const DEFAULT_TURN_URLS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Twilio account used for provider-delegated relay credentials.
#[derive(Debug)]
pub struct TwilioConfig {
    /// Account SID.
    pub account_sid: String,
    /// Auth token.
    pub auth_token: SecretString,
}

/// Typed service configuration.
#[derive(Debug)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// PostgreSQL URL; `None` selects the non-durable in-memory stores.
    pub database_url: Option<String>,
    /// YAML template list seeding the in-memory template store; the embedded
    /// catalog is used when unset.
    pub templates_file: Option<String>,
    /// Ordered realtime provider keys; never empty.
    pub openai_api_keys: Vec<SecretString>,
    /// Realtime provider base URL.
    pub realtime_base_url: String,
    /// Session model configuration.
    pub session: SessionConfig,
    /// Timeout applied to every upstream call.
    pub upstream_timeout: Duration,
    /// Handling of out-of-range session ttl.
    pub ttl_policy: TtlPolicy,
    /// Shared secret for local relay credential derivation.
    pub turn_shared_secret: Option<SecretString>,
    /// Relay and STUN endpoints.
    pub turn_urls: Vec<String>,
    /// Provider-delegated relay credentials.
    pub twilio: Option<TwilioConfig>,
    /// Whether the ungated demo surface is mounted.
    pub demo_enabled: bool,
    /// OTLP collector endpoint.
    pub otlp_endpoint: Option<String>,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("{name} must be a boolean, got '{other}'"))),
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };

        let openai_api_keys: Vec<SecretString> = var("OPENAI_API_KEYS")
            .map(|keys| split_list(&keys))
            .or_else(|| var("OPENAI_API_KEY").map(|key| vec![key.trim().to_owned()]))
            .unwrap_or_default()
            .into_iter()
            .map(SecretString::from)
            .collect();
        if openai_api_keys.is_empty() {
            return Err(AppError::Config(
                "OPENAI_API_KEYS or OPENAI_API_KEY must be set".to_owned(),
            ));
        }

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs.trim().parse().map_err(|e| {
                    AppError::Config(format!("UPSTREAM_TIMEOUT_SECS must be seconds: {e}"))
                })?;
                if secs == 0 {
                    return Err(AppError::Config(
                        "UPSTREAM_TIMEOUT_SECS must be positive".to_owned(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        let ttl_policy = match var("TOKEN_TTL_POLICY") {
            Some(policy) => policy
                .parse()
                .map_err(|e| AppError::Config(format!("TOKEN_TTL_POLICY: {e}")))?,
            None => TtlPolicy::default(),
        };

        let mut session = SessionConfig::default();
        if let Some(model) = var("REALTIME_MODEL") {
            session.model = model;
        }
        if let Some(voice) = var("REALTIME_VOICE") {
            session.voice = voice;
        }
        if let Some(model) = var("REALTIME_TRANSCRIPTION_MODEL") {
            session.transcription_model = Some(model);
        }

        let twilio = match (var("TWILIO_ACCOUNT_SID"), var("TWILIO_AUTH_TOKEN")) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioConfig {
                account_sid,
                auth_token: SecretString::from(auth_token),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            database_url: var("DATABASE_URL"),
            templates_file: var("TEMPLATES_FILE"),
            openai_api_keys,
            realtime_base_url: var("REALTIME_BASE_URL")
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned()),
            session,
            upstream_timeout,
            ttl_policy,
            turn_shared_secret: var("TURN_SHARED_SECRET").map(SecretString::from),
            turn_urls: var("TURN_URLS").map_or_else(
                || DEFAULT_TURN_URLS.iter().map(|u| (*u).to_owned()).collect(),
                |urls| split_list(&urls),
            ),
            twilio,
            demo_enabled: var("DEMO_ENABLED")
                .map(|v| parse_bool("DEMO_ENABLED", &v))
                .transpose()?
                .unwrap_or(true),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
