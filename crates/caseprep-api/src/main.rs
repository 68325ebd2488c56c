//! CasePrep API server entry point.

use std::sync::{Arc, Mutex};

use caseprep_api::config::AppConfig;
use caseprep_api::demo::DemoCatalog;
use caseprep_api::error::AppError;
use caseprep_api::state::{self, AppState};
use caseprep_api::{routes, telemetry};
use caseprep_core::auth::{AdminOnlyAuthorizer, OwnershipAuthorizer};
use caseprep_core::clock::{Clock, SystemClock};
use caseprep_core::rng::ThreadRng;
use caseprep_realtime::application::issuer::CredentialIssuer;
use caseprep_realtime::domain::key_pool::KeyPool;
use caseprep_realtime::provider::openai::OpenAiRealtimeProvider;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let mut config = AppConfig::from_env()?;
    let tracer_provider = telemetry::init_tracing(config.otlp_endpoint.as_deref())?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting caseprep api server");

    let (interviews, templates) = state::stores(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let provider = OpenAiRealtimeProvider::new(&config.realtime_base_url, config.upstream_timeout)
        .map_err(|e| AppError::Config(format!("realtime provider: {e}")))?;
    let issuer = CredentialIssuer::new(
        Arc::new(KeyPool::new(std::mem::take(&mut config.openai_api_keys))?),
        Arc::new(provider),
        config.session.clone(),
        config.ttl_policy,
    );
    info!(keys = issuer.pool().len(), "realtime key pool ready");

    let relay = state::relay_from_config(&config, &clock)?;
    match &relay {
        Some(source) => info!(source = source.name(), "relay credentials enabled"),
        None => warn!("no relay source configured; relay credential requests will fail"),
    }

    let demo = if config.demo_enabled {
        let catalog = DemoCatalog::load()?;
        info!(cases = catalog.cases().len(), "demo surface enabled");
        Some(Arc::new(catalog))
    } else {
        None
    };

    let app_state = AppState {
        clock,
        rng: Arc::new(Mutex::new(ThreadRng)),
        interviews,
        templates,
        authorizer: Arc::new(OwnershipAuthorizer),
        reset_authorizer: Arc::new(AdminOnlyAuthorizer),
        issuer: Arc::new(issuer),
        relay,
        demo,
    };

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, routes::app(app_state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            warn!(error = %e, "tracer provider shutdown failed");
        }
    }
    Ok(())
}
