//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::{BookingConfig, Config};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;
use wizard::MissingPrerequisitePolicy;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_config(config: Config) -> Router {
    let state = api::create_default_state(config);
    api::create_app(state, get_metrics_handle())
}

fn setup() -> Router {
    setup_with_config(Config::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_wizard(app: &Router, flow: &str) -> String {
    let (status, json) = send(app, "POST", "/wizards", Some(json!({ "flow": flow }))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    create_wizard(&app, "booking").await;

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_wizard(&app, "subscription").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("wizard_sessions_created_total"));
    assert!(text.contains("wizard_sessions_active"));
}

#[tokio::test]
async fn test_booking_config() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/config/booking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["enabled"], true);
    assert_eq!(json["currency_symbol"], "€");
    assert_eq!(json["token_symbol"], "TDF");
    assert_eq!(json["chain_id"], 42220);
    assert_eq!(json["missing_prerequisite_policy"], "restart");
}

#[tokio::test]
async fn test_create_wizard_snapshot() {
    let app = setup();

    let (status, json) = send(&app, "POST", "/wizards", Some(json!({ "flow": "token-sale" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["flow"], "token-sale");
    assert_eq!(json["current"], "eligibility");
    assert_eq!(json["progress"], json!({ "current": 1, "total": 5 }));
    assert_eq!(json["steps"][4]["path"], "success");
    assert_eq!(json["steps"][4]["next"], Value::Null);
}

#[tokio::test]
async fn test_unknown_flow_is_rejected() {
    let app = setup();

    let (status, _) = send(&app, "POST", "/wizards", Some(json!({ "flow": "cruise" }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_booking_disabled() {
    let app = setup_with_config(Config {
        booking: BookingConfig {
            enabled: false,
            ..BookingConfig::default()
        },
        ..Config::default()
    });

    let (status, json) = send(&app, "POST", "/wizards", Some(json!({ "flow": "booking" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Booking is disabled");

    create_wizard(&app, "subscription").await;
}

#[tokio::test]
async fn test_unknown_and_malformed_session_ids() {
    let app = setup();

    let (status, _) = send(
        &app,
        "GET",
        "/wizards/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/wizards/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_step_and_read_draft() {
    let app = setup();
    let id = create_wizard(&app, "subscription").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/wizards/{id}/steps/plan"),
        Some(json!({ "plan_id": "yearly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["steps"][0]["data"]["plan_id"], "yearly");

    let (status, json) = send(
        &app,
        "POST",
        &format!("/wizards/{id}/current"),
        Some(json!({ "path": "summary" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"], "summary");
    assert_eq!(json["progress"]["current"], 2);

    let (status, json) = send(&app, "GET", &format!("/wizards/{id}/draft"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["plan"], json!({ "plan_id": "yearly" }));
    assert_eq!(json["summary"], json!({}));
}

#[tokio::test]
async fn test_invalid_step_path() {
    let app = setup();
    let id = create_wizard(&app, "subscription").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/wizards/{id}/steps/payment"),
        Some(json!({ "x": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Invalid step path 'payment', valid paths are: plan, summary, checkout, success"
    );

    let (_, json) = send(&app, "GET", &format!("/wizards/{id}/draft"), None).await;
    assert_eq!(json["plan"], json!({}));
}

#[tokio::test]
async fn test_guard_reports_missing_prerequisite() {
    let app = setup();
    let id = create_wizard(&app, "booking").await;

    let (status, json) = send(&app, "GET", &format!("/wizards/{id}/steps/dates/guard"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["proceed"], false);
    assert_eq!(json["missing"]["requires"], "guests");
    assert_eq!(json["missing"]["key"], "adults");

    send(
        &app,
        "PUT",
        &format!("/wizards/{id}/steps/guests"),
        Some(json!({ "adults": 2 })),
    )
    .await;
    let (_, json) = send(&app, "GET", &format!("/wizards/{id}/steps/dates/guard"), None).await;
    assert_eq!(json["proceed"], true);
    assert_eq!(json["missing"], Value::Null);
}

#[tokio::test]
async fn test_reset_and_dispose() {
    let app = setup();
    let id = create_wizard(&app, "booking").await;
    send(
        &app,
        "PUT",
        &format!("/wizards/{id}/steps/guests"),
        Some(json!({ "adults": 2 })),
    )
    .await;

    let (status, json) = send(&app, "POST", &format!("/wizards/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["steps"][0]["data"], json!({}));

    let (status, _) = send(&app, "DELETE", &format!("/wizards/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/wizards/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_booking_flow() {
    let app = setup();
    let id = create_wizard(&app, "booking").await;
    let page = |name: &str| format!("/wizards/{id}/booking/{name}");

    let (status, json) = send(&app, "POST", &page("guests"), Some(json!({ "adults": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"], json!({ "kind": "next", "path": "dates" }));
    assert_eq!(json["wizard"]["current"], "dates");

    let (status, json) = send(
        &app,
        "POST",
        &page("dates"),
        Some(json!({ "start_date": "2033-08-01", "end_date": "2033-08-06" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"]["path"], "accommodation");
    assert_eq!(json["wizard"]["steps"][1]["data"]["nights"], 5);

    let (status, json) = send(
        &app,
        "POST",
        &page("accommodation"),
        Some(json!({ "listing_id": "glamping" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"]["path"], "questionnaire");
    assert_eq!(json["wizard"]["steps"][2]["data"]["rental_cents"], 32500);

    let (status, json) = send(
        &app,
        "POST",
        &page("questionnaire"),
        Some(json!({ "dietary": "none" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"]["path"], "checkout");

    let (status, json) = send(&app, "POST", &page("checkout"), Some(json!({ "method": "token" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"]["path"], "confirmation");
    assert_eq!(json["wizard"]["steps"][4]["data"]["status"], "paid");

    let (status, json) = send(&app, "GET", &page("confirmation"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"], json!({ "kind": "complete" }));
    assert_eq!(json["confirmation"]["listing_name"], "Glamping tent");
    assert_eq!(json["rental"], "€325.00");
    assert_eq!(json["tokens"], "5 TDF");
    assert_eq!(json["wizard"]["current"], "confirmation");
}

#[tokio::test]
async fn test_skipping_ahead_restarts_by_default() {
    let app = setup();
    let id = create_wizard(&app, "booking").await;
    send(
        &app,
        "PUT",
        &format!("/wizards/{id}/steps/guests"),
        Some(json!({ "adults": 2 })),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/wizards/{id}/booking/checkout"),
        Some(json!({ "method": "fiat" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["navigation"], json!({ "kind": "restart", "path": "guests" }));
    assert_eq!(json["wizard"]["steps"][0]["data"], json!({}));
}

#[tokio::test]
async fn test_skipping_ahead_conflicts_under_reject_policy() {
    let app = setup_with_config(Config {
        booking: BookingConfig {
            missing_prerequisite_policy: MissingPrerequisitePolicy::Reject,
            ..BookingConfig::default()
        },
        ..Config::default()
    });
    let id = create_wizard(&app, "booking").await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/wizards/{id}/booking/dates"),
        Some(json!({ "start_date": "2033-08-01", "end_date": "2033-08-06" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("guests"));
}

#[tokio::test]
async fn test_invalid_booking_input() {
    let app = setup();
    let id = create_wizard(&app, "booking").await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/wizards/{id}/booking/guests"),
        Some(json!({ "adults": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid input: At least one adult is required");
}

#[tokio::test]
async fn test_booking_pages_need_a_booking_session() {
    let app = setup();
    let id = create_wizard(&app, "subscription").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/wizards/{id}/booking/guests"),
        Some(json!({ "adults": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
