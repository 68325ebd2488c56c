//! Shared application state.

use std::sync::{Arc, Mutex};

use caseprep_core::auth::Authorizer;
use caseprep_core::clock::Clock;
use caseprep_core::rng::DeterministicRng;
use caseprep_interview::domain::repository::{InterviewRepository, TemplateRepository};
use caseprep_interview::domain::template::Template;
use caseprep_realtime::application::issuer::CredentialIssuer;
use caseprep_relay::RelayCredentialSource;
use caseprep_relay::failover::FailoverRelaySource;
use caseprep_relay::local::HmacRelaySource;
use caseprep_relay::twilio::{self, TwilioRelaySource};
use caseprep_store::memory::{InMemoryInterviewStore, InMemoryTemplateStore};
use caseprep_store::pg::{PgInterviewStore, PgTemplateStore};
use caseprep_store::schema::run_migrations;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::demo::{self, DemoCatalog};
use crate::error::AppError;

/// Interview and template stores for the authenticated surface.
pub type Stores = (Arc<dyn InterviewRepository>, Arc<dyn TemplateRepository>);

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock used for every timestamp and expiry.
    pub clock: Arc<dyn Clock>,
    /// Random source for guest relay scopes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Interview store for the authenticated surface.
    pub interviews: Arc<dyn InterviewRepository>,
    /// Template store for the authenticated surface.
    pub templates: Arc<dyn TemplateRepository>,
    /// Ownership-or-admin check for interview access.
    pub authorizer: Arc<dyn Authorizer>,
    /// Check for progress reset on the authenticated surface.
    pub reset_authorizer: Arc<dyn Authorizer>,
    /// Session credential issuer.
    pub issuer: Arc<CredentialIssuer>,
    /// Relay credential source; `None` when relay is not configured.
    pub relay: Option<Arc<dyn RelayCredentialSource>>,
    /// Demo catalog; `None` when the demo surface is disabled.
    pub demo: Option<Arc<DemoCatalog>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("issuer", &self.issuer)
            .field("relay", &self.relay.as_ref().map(|r| r.name()))
            .field("demo", &self.demo.is_some())
            .finish_non_exhaustive()
    }
}

async fn seed_templates(config: &AppConfig) -> Result<Vec<Template>, AppError> {
    match config.templates_file.as_deref() {
        Some(path) => {
            let yaml = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| AppError::Config(format!("TEMPLATES_FILE {path}: {e}")))?;
            Ok(demo::templates_from_yaml(&yaml)?)
        }
        None => Ok(demo::catalog_templates()?),
    }
}

/// Builds the stores for the authenticated surface.
///
/// With `DATABASE_URL` set, connects, applies migrations and returns the
/// PostgreSQL stores. Otherwise returns in-memory stores whose templates
/// come from `TEMPLATES_FILE`, or from the embedded catalog when that is
/// unset.
///
/// # Errors
///
/// Returns `AppError::Database` if the pool cannot connect,
/// `AppError::Config` if the templates file cannot be read, and
/// `AppError::Startup` if migrations fail or a template is malformed.
pub async fn stores(config: &AppConfig) -> Result<Stores, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set; interview progress is kept in memory and lost on restart");
        let seed = seed_templates(config).await?;
        info!(templates = seed.len(), "seeding in-memory template store");
        let templates = InMemoryTemplateStore::from_templates(seed)?;
        return Ok((Arc::new(InMemoryInterviewStore::new()), Arc::new(templates)));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    run_migrations(&pool).await?;
    info!("database migrations applied");

    Ok((
        Arc::new(PgInterviewStore::new(pool.clone())),
        Arc::new(PgTemplateStore::new(pool)),
    ))
}

/// Selects the relay credential source from configuration.
///
/// With both a Twilio account and a shared secret, Twilio is tried first and
/// the locally derived credential is the fallback. With neither, relay is
/// disabled.
///
/// # Errors
///
/// Returns `AppError::Startup` if the Twilio client cannot be built.
pub fn relay_from_config(
    config: &AppConfig,
    clock: &Arc<dyn Clock>,
) -> Result<Option<Arc<dyn RelayCredentialSource>>, AppError> {
    let local = config.turn_shared_secret.as_ref().map(|secret| {
        Arc::new(HmacRelaySource::new(
            SecretString::from(secret.expose_secret().to_owned()),
            config.turn_urls.clone(),
            Arc::clone(clock),
        )) as Arc<dyn RelayCredentialSource>
    });
    let remote = config
        .twilio
        .as_ref()
        .map(|twilio_config| {
            TwilioRelaySource::new(
                twilio::DEFAULT_BASE_URL,
                twilio_config.account_sid.clone(),
                SecretString::from(twilio_config.auth_token.expose_secret().to_owned()),
                config.upstream_timeout,
                Arc::clone(clock),
            )
            .map(|source| Arc::new(source) as Arc<dyn RelayCredentialSource>)
        })
        .transpose()?;

    Ok(match (remote, local) {
        (Some(remote), Some(local)) => Some(Arc::new(FailoverRelaySource::new(remote, local))),
        (Some(source), None) | (None, Some(source)) => Some(source),
        (None, None) => None,
    })
}
