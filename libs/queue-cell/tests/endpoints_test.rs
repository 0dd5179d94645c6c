mod common;

use axum::body::{to_bytes, Body};
use axum::response::Response;
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::test_state;
use queue_cell::create_queue_router;

fn app(hour: u32) -> Router {
    create_queue_router(test_state(hour))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn booking(provider_id: Uuid, appointment_id: Uuid, is_emergency: bool) -> Value {
    json!({
        "provider_id": provider_id,
        "appointment_id": appointment_id,
        "queue_date": "2025-06-02",
        "is_emergency": is_emergency,
        "avg_consult_minutes": 15.0
    })
}

#[tokio::test]
async fn test_booking_returns_token_and_estimate() {
    let app = app(9);
    let provider = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["token_number"], 1);
    assert_eq!(body["position"], 1);
    assert_eq!(body["estimated_wait_minutes"], 5);
    assert_eq!(body["estimate_degraded"], false);
}

#[tokio::test]
async fn test_duplicate_booking_maps_to_conflict() {
    let app = app(9);
    let provider = Uuid::new_v4();
    let appointment = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post("/tokens", booking(provider, appointment, false)))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/tokens", booking(provider, appointment, false)))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Appointment already queued");
}

#[tokio::test]
async fn test_transition_unknown_token_maps_to_not_found() {
    let app = app(9);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/tokens/{}/status", Uuid::new_v4()),
            json!({ "target_status": "serving" }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_illegal_transition_maps_to_bad_request() {
    let app = app(9);
    let provider = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
        .await
        .expect("request should succeed");
    let token_id = body_json(response).await["token_id"]
        .as_str()
        .expect("token id in response")
        .to_string();

    let response = app
        .clone()
        .oneshot(post(
            &format!("/tokens/{}/status", token_id),
            json!({ "target_status": "completed" }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_busy_provider_maps_to_conflict() {
    let app = app(9);
    let provider = Uuid::new_v4();

    let first = body_json(
        app.clone()
            .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
            .await
            .expect("request should succeed"),
    )
    .await;
    let second = body_json(
        app.clone()
            .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
            .await
            .expect("request should succeed"),
    )
    .await;

    let response = app
        .clone()
        .oneshot(post(
            &format!("/tokens/{}/status", first["token_id"].as_str().unwrap()),
            json!({ "target_status": "serving" }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/tokens/{}/status", second["token_id"].as_str().unwrap()),
            json!({ "target_status": "serving" }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_snapshot_and_stats_endpoints() {
    let app = app(9);
    let provider = Uuid::new_v4();

    let first = body_json(
        app.clone()
            .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
            .await
            .expect("request should succeed"),
    )
    .await;
    app.clone()
        .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), true)))
        .await
        .expect("request should succeed");

    app.clone()
        .oneshot(post(
            &format!("/tokens/{}/status", first["token_id"].as_str().unwrap()),
            json!({ "target_status": "serving" }),
        ))
        .await
        .expect("request should succeed");

    let response = app
        .clone()
        .oneshot(get(&format!("/queues/{}/2025-06-02", provider)))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["serving"]["token_number"], 1);
    assert_eq!(snapshot["waiting"][0]["token_number"], 2);
    assert_eq!(snapshot["waiting"][0]["position"], 1);
    assert_eq!(snapshot["waiting"][0]["is_emergency"], true);

    let response = app
        .clone()
        .oneshot(get(&format!("/queues/{}/2025-06-02/stats", provider)))
        .await
        .expect("request should succeed");
    let stats = body_json(response).await;
    assert_eq!(stats["waiting"], 1);
    assert_eq!(stats["emergency_waiting"], 1);
    assert_eq!(stats["now_serving"], 1);
}

#[tokio::test]
async fn test_estimate_endpoint_mirrors_the_live_queue() {
    let app = app(11);
    let provider = Uuid::new_v4();

    for _ in 0..4 {
        app.clone()
            .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
            .await
            .expect("request should succeed");
    }

    let response = app
        .clone()
        .oneshot(post(
            "/estimate",
            json!({
                "provider_id": provider,
                "queue_date": "2025-06-02",
                "is_emergency": false,
                "avg_consult_minutes": 15.0,
                "hour_of_day": 11
            }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["queue_length"], 4);
    // 4 * 15 * 1.2 peak
    assert_eq!(body["predicted_wait_minutes"], 72);
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn test_estimate_endpoint_degrades_without_average() {
    let app = app(9);

    let response = app
        .clone()
        .oneshot(post(
            "/estimate",
            json!({
                "provider_id": Uuid::new_v4(),
                "queue_date": "2025-06-02"
            }),
        ))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["degraded"], true);
    assert_eq!(body["avg_consult_minutes"], 15.0);
    assert_eq!(body["predicted_wait_minutes"], 5);
}

#[tokio::test]
async fn test_audit_read_returns_all_timestamps() {
    let app = app(9);
    let provider = Uuid::new_v4();

    let issued = body_json(
        app.clone()
            .oneshot(post("/tokens", booking(provider, Uuid::new_v4(), false)))
            .await
            .expect("request should succeed"),
    )
    .await;
    let token_id = issued["token_id"].as_str().expect("token id").to_string();

    for target in ["serving", "completed"] {
        app.clone()
            .oneshot(post(
                &format!("/tokens/{}/status", token_id),
                json!({ "target_status": target }),
            ))
            .await
            .expect("request should succeed");
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/tokens/{}", token_id)))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["token"]["status"], "completed");
    assert!(!body["token"]["check_in_time"].is_null());
    assert!(!body["token"]["called_time"].is_null());
    assert!(!body["token"]["completed_time"].is_null());
}
