//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use caseprep_api::demo::DemoCatalog;
use caseprep_api::extract::{USER_ID_HEADER, USER_ROLE_HEADER};
use caseprep_api::routes;
use caseprep_api::state::{AppState, Stores};
use caseprep_core::auth::{AdminOnlyAuthorizer, OwnershipAuthorizer};
use caseprep_core::clock::Clock;
use caseprep_core::rng::DeterministicRng;
use caseprep_interview::domain::template::Template;
use caseprep_realtime::application::issuer::CredentialIssuer;
use caseprep_realtime::domain::key_pool::KeyPool;
use caseprep_realtime::domain::session::{SessionConfig, TtlPolicy};
use caseprep_realtime::testing::{ScriptedProvider, template_with_questions};
use caseprep_relay::RelayCredentialSource;
use caseprep_relay::local::HmacRelaySource;
use caseprep_store::memory::{InMemoryInterviewStore, InMemoryTemplateStore};
use caseprep_test_support::{FixedClock, SequenceRng};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use uuid::Uuid;

/// Shared secret of the test relay source.
pub const RELAY_SECRET: &str = "relay-test-secret";

/// Relay URL of the test relay source.
pub const RELAY_URL: &str = "turn:relay.test:3478";

/// A built app plus handles on the fakes behind it.
pub struct TestApp {
    /// The full router, as served by `main.rs`.
    pub router: Router,
    /// The provider every session request reaches.
    pub provider: Arc<ScriptedProvider>,
    /// The only template in the authenticated catalog (three questions).
    pub template: Template,
}

/// Knobs for [`build_test_app_with`].
pub struct TestAppOptions {
    /// Provider behavior.
    pub provider: ScriptedProvider,
    /// Number of keys in the pool.
    pub keys: usize,
    /// Whether a relay source is configured.
    pub relay: bool,
    /// Whether the demo surface is mounted.
    pub demo: bool,
    /// Random source for guest relay scopes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Stores for the authenticated surface; defaults to in-memory stores
    /// holding only [`TestApp::template`].
    pub stores: Option<Stores>,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            provider: ScriptedProvider::succeeding(),
            keys: 2,
            relay: true,
            demo: true,
            rng: Arc::new(Mutex::new(SequenceRng::new(vec![0xab, 0xcd, 0x01, 0x02]))),
            stores: None,
        }
    }
}

/// Build the full app with in-memory stores, a scripted provider and a fixed
/// clock.
pub fn build_test_app() -> TestApp {
    build_test_app_with(TestAppOptions::default())
}

/// Build the full app with custom fakes.
pub fn build_test_app_with(options: TestAppOptions) -> TestApp {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_default());
    let template = template_with_questions(3);
    let (interviews, templates) = options.stores.unwrap_or_else(|| {
        (
            Arc::new(InMemoryInterviewStore::new()),
            Arc::new(InMemoryTemplateStore::from_templates(vec![template.clone()]).unwrap()),
        )
    });

    let provider = Arc::new(options.provider);
    let pool = KeyPool::new(
        (0..options.keys)
            .map(|i| SecretString::from(format!("sk-test-{i}")))
            .collect(),
    )
    .unwrap();
    let issuer = CredentialIssuer::new(
        Arc::new(pool),
        provider.clone(),
        SessionConfig::default(),
        TtlPolicy::Reject,
    );

    let relay = options.relay.then(|| {
        Arc::new(HmacRelaySource::new(
            SecretString::from(RELAY_SECRET),
            vec![RELAY_URL.to_owned()],
            clock.clone(),
        )) as Arc<dyn RelayCredentialSource>
    });
    let demo = options
        .demo
        .then(|| Arc::new(DemoCatalog::load().unwrap()));

    let state = AppState {
        clock,
        rng: options.rng,
        interviews,
        templates,
        authorizer: Arc::new(OwnershipAuthorizer),
        reset_authorizer: Arc::new(AdminOnlyAuthorizer),
        issuer: Arc::new(issuer),
        relay,
        demo,
    };

    TestApp {
        router: routes::app(state),
        provider,
        template,
    }
}

/// Identity headers for one request.
#[derive(Debug, Clone, Copy)]
pub enum As {
    /// No identity headers.
    Anonymous,
    /// A member with the given id.
    Member(Uuid),
    /// An admin with the given id.
    Admin(Uuid),
}

fn request(method: &str, uri: &str, who: As, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    builder = match who {
        As::Anonymous => builder,
        As::Member(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "member"),
        As::Admin(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "admin"),
    };
    builder.body(body).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    who: As,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        request("POST", uri, who, Body::from(serde_json::to_vec(body).unwrap())),
    )
    .await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: &Router, uri: &str, who: As) -> (StatusCode, serde_json::Value) {
    send(app, request("POST", uri, who, Body::empty())).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str, who: As) -> (StatusCode, serde_json::Value) {
    send(app, request("GET", uri, who, Body::empty())).await
}

/// Starts an interview for `owner` on the test template and returns its id.
pub async fn start_interview(app: &TestApp, owner: Uuid) -> Uuid {
    let (status, json) = post_json(
        &app.router,
        "/api/v1/interviews",
        As::Member(owner),
        &serde_json::json!({ "template_id": app.template.id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().parse().unwrap()
}
