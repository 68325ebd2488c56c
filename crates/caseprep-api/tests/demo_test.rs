//! Integration tests for the ungated demo surface.

mod common;

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use caseprep_test_support::MockRng;
use common::{As, TestAppOptions};

const MARKET_ENTRY_INTERVIEW: &str = "44444444-4444-4444-4444-444444444444";

#[tokio::test]
async fn test_demo_lists_catalog_templates() {
    let app = common::build_test_app();

    let (status, json) =
        common::get_json(&app.router, "/api/v1/demo/templates", As::Anonymous).await;

    assert_eq!(status, StatusCode::OK);
    let templates = json.as_array().unwrap();
    assert_eq!(templates.len(), 3);
    assert_eq!(templates[0]["id"], "11111111-1111-1111-1111-111111111111");
    assert!(templates.iter().all(|t| t["question_count"] == 4));
}

#[tokio::test]
async fn test_demo_returns_full_template_by_id() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(
        &app.router,
        "/api/v1/demo/templates/22222222-2222-2222-2222-222222222222",
        As::Anonymous,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lead_type"], "candidate-led");
    assert_eq!(json["questions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_demo_interview_is_created_lazily_with_fixed_id() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(
        &app.router,
        "/api/v1/demo/interviews/market-entry",
        As::Anonymous,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["case_type"], "market-entry");
    assert_eq!(json["id"], MARKET_ENTRY_INTERVIEW);
    assert_eq!(json["current_question"], 1);
    assert_eq!(json["version"], 0);
}

#[tokio::test]
async fn test_demo_unknown_case_returns_404() {
    let app = common::build_test_app();

    let (status, json) =
        common::get_json(&app.router, "/api/v1/demo/interviews/pricing", As::Anonymous).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "template_not_found");
}

#[tokio::test]
async fn test_demo_progression_and_reset() {
    let app = common::build_test_app();

    // Question 2 is locked until question 1 is completed.
    let (status, json) = common::get_json(
        &app.router,
        "/api/v1/demo/interviews/merger/questions/2/token",
        As::Anonymous,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_question");

    let (status, json) = common::post_json(
        &app.router,
        "/api/v1/demo/interviews/complete-question",
        As::Anonymous,
        &serde_json::json!({ "case_type": "merger", "question_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["case_type"], "merger");
    assert_eq!(json["current_question"], 2);

    let (status, json) = common::get_json(
        &app.router,
        "/api/v1/demo/interviews/merger/questions/2/token?ttl=900",
        As::Anonymous,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["question_number"], 2);
    assert_eq!(json["ttl"], 900);
    assert_eq!(json["interview_id"], "66666666-6666-6666-6666-666666666666");

    // Demo reset needs no admin role.
    let (status, json) =
        common::post_empty(&app.router, "/api/v1/demo/reset/merger", As::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_question"], 1);
    assert_eq!(json["questions_completed"], serde_json::json!([]));
}

#[tokio::test]
async fn test_demo_progress_is_isolated_per_case() {
    let app = common::build_test_app();

    let (status, _) = common::post_json(
        &app.router,
        "/api/v1/demo/interviews/complete-question",
        As::Anonymous,
        &serde_json::json!({ "case_type": "profitability", "question_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = common::get_json(
        &app.router,
        "/api/v1/demo/interviews/market-entry",
        As::Anonymous,
    )
    .await;
    assert_eq!(json["current_question"], 1);
}

#[tokio::test]
async fn test_demo_turn_credentials_use_random_guest_scope() {
    let app = common::build_test_app();

    let (status, json) =
        common::get_json(&app.router, "/api/v1/demo/turn-credentials", As::Anonymous).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "1768557600:demo-user-abcd0102");
    assert_eq!(json["ttl"], 86_400);
}

#[tokio::test]
async fn test_demo_turn_credentials_scope_comes_from_injected_rng() {
    let app = common::build_test_app_with(TestAppOptions {
        rng: Arc::new(Mutex::new(MockRng)),
        ..TestAppOptions::default()
    });

    let (status, json) =
        common::get_json(&app.router, "/api/v1/demo/turn-credentials?ttl=600", As::Anonymous)
            .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "1768471800:demo-user-00000000");
    assert_eq!(json["ttl"], 600);
}

#[tokio::test]
async fn test_demo_surface_absent_when_disabled() {
    let app = common::build_test_app_with(TestAppOptions {
        demo: false,
        ..TestAppOptions::default()
    });

    let (status, _) = common::get_json(&app.router, "/api/v1/demo/templates", As::Anonymous).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
