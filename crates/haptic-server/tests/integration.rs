use axum::http::StatusCode;
use haptic_core::config::Config;
use haptic_server::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app() -> axum::Router {
    build_router(AppState::new(Config::default()).unwrap())
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// State and catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_state_has_defaults() {
    let (status, body) = get(app(), "/api/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coaching"]["likability"], 78);
    assert_eq!(body["coaching"]["interest"], 92);
    assert_eq!(body["coaching"]["speaking_speed"], 85);
    assert_eq!(body["coaching"]["session_type_label"], "소개팅");
    assert_eq!(body["peer_label"], "연결 중...");
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn patterns_lists_builtin_catalog() {
    let (status, body) = get(app(), "/api/patterns").await;
    assert_eq!(status, StatusCode::OK);
    let patterns = body.as_array().unwrap();
    assert_eq!(patterns.len(), 8);

    let s1 = patterns.iter().find(|p| p["id"] == "S1").unwrap();
    assert_eq!(s1["pulses"].as_array().unwrap().len(), 3);
    assert_eq!(s1["span_ms"], 400);

    let s2 = patterns.iter().find(|p| p["id"] == "S2").unwrap();
    assert_eq!(s2["mirror_on"], "loud");
}

#[tokio::test]
async fn events_endpoint_is_sse() {
    let req = axum::http::Request::builder()
        .uri("/api/events")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_start_session_acks_and_updates_state() {
    let app = app();
    let (status, ack) = post_json(
        app.clone(),
        "/api/inbound/direct",
        json!({"action": "startSession", "sessionType": "발표"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "received");
    assert_eq!(ack["action"], "startSession");
    assert_eq!(ack["watchAppActive"], true);

    let (_, state) = get(app, "/api/state").await;
    assert_eq!(state["coaching"]["session_active"], true);
    assert_eq!(state["coaching"]["session_type_label"], "발표");
    assert_eq!(state["navigate_to_session"], true);
    assert_eq!(state["notification_text"], "발표 세션이 시작되었습니다");
}

#[tokio::test]
async fn unrecognized_and_missing_actions_still_ack() {
    let app = app();
    let (_, ack) = post_json(app.clone(), "/api/inbound/direct", json!({"action": "wave"})).await;
    assert_eq!(ack["action"], "wave");
    assert_eq!(ack["status"], "received");

    let (_, ack) = post_json(app, "/api/inbound/direct", json!({"message": "hi"})).await;
    assert_eq!(ack["action"], "unknown");
}

#[tokio::test]
async fn durable_delivery_applies_without_ack() {
    let app = app();
    let (status, _) = post_json(
        app.clone(),
        "/api/inbound/durable",
        json!({"action": "realtimeAnalysis", "likability": 33, "emotion": "긴장"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, state) = get(app.clone(), "/api/state").await;
    assert_eq!(state["coaching"]["likability"], 33);
    assert_eq!(state["coaching"]["emotion"], "긴장");
    assert_eq!(state["coaching"]["interest"], 92);

    let (_, outbox) = get(app, "/api/outbox").await;
    assert_eq!(outbox, json!([]));
}

// ---------------------------------------------------------------------------
// Link and outbound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_send_goes_durable_only() {
    let app = app();
    let (status, _) = post_json(
        app.clone(),
        "/api/send",
        json!({"action": "hapticFeedback", "message": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, outbox) = get(app, "/api/outbox").await;
    let entries = outbox.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["channel"], "durable");
    assert_eq!(entries[0]["payload"]["message"], "x");
}

#[tokio::test]
async fn reachable_send_goes_direct() {
    let app = app();
    let (_, snap) = post_json(
        app.clone(),
        "/api/link/reachability",
        json!({"reachable": true}),
    )
    .await;
    assert_eq!(snap["peer_label"], "연결 중...");

    post_json(app.clone(), "/api/send", json!({"action": "ping"})).await;
    let (_, outbox) = get(app, "/api/outbox").await;
    let entries = outbox.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["channel"], "direct");
    assert_eq!(entries[0]["delivered"], true);
}

#[tokio::test]
async fn outbox_keeps_only_recent_sends() {
    let mut config = Config::default();
    config.delivery.outbox_capacity = 2;
    let app = build_router(AppState::new(config).unwrap());
    for n in 0..5 {
        post_json(app.clone(), "/api/send", json!({ "n": n })).await;
    }

    let (_, outbox) = get(app, "/api/outbox").await;
    let entries = outbox.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["payload"]["n"], 3);
    assert_eq!(entries[1]["payload"]["n"], 4);
}

#[tokio::test]
async fn activation_connects_and_announces_once() {
    let app = app();
    post_json(
        app.clone(),
        "/api/link/reachability",
        json!({"reachable": true}),
    )
    .await;
    let (status, snap) = post_json(
        app.clone(),
        "/api/link/activation",
        json!({"activated": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["connected"], true);
    assert_eq!(snap["peer_label"], "연결됨: Apple Watch");

    post_json(
        app.clone(),
        "/api/link/activation",
        json!({"activated": true}),
    )
    .await;

    let (_, outbox) = get(app, "/api/outbox").await;
    let announcements: Vec<_> = outbox
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["payload"]["action"] == "watchConnected")
        .collect();
    assert_eq!(announcements.len(), 1);
    assert_eq!(announcements[0]["payload"]["watchReady"], true);
}

#[tokio::test]
async fn failed_activation_reads_disconnected() {
    let (_, snap) = post_json(
        app(),
        "/api/link/activation",
        json!({"activated": false, "error": "not paired"}),
    )
    .await;
    assert_eq!(snap["connected"], false);
    assert_eq!(snap["peer_label"], "연결 안됨");
}

// ---------------------------------------------------------------------------
// Haptics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_haptics_reports_configured_sequence() {
    let (status, body) = post_json(app(), "/api/haptics/test", json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["strength"], "basic");
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn play_unknown_pattern_falls_back() {
    let (status, body) = post_json(app(), "/api/haptics/play", json!({"patternId": "Z9"})).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["pattern"], "default");
    assert_eq!(body["pulses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn play_variant_is_mirrored() {
    let (_, body) = post_json(
        app(),
        "/api/haptics/play",
        json!({"patternId": "S2", "variant": "volume_loud"}),
    )
    .await;
    assert_eq!(body["pulses"][0]["intensity"], "strong");
    assert_eq!(body["pulses"][1]["intensity"], "light");
}

#[tokio::test]
async fn play_empty_id_is_bad_request() {
    let (status, body) = post_json(app(), "/api/haptics/play", json!({"patternId": " "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("patternId"));
}
