//! End-to-end API tests against a mock Firestore endpoint.
//!
//! The router is exercised with `tower::ServiceExt::oneshot`; the store
//! client is pointed at a wiremock server through its emulator support.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playline_api::security::compute_signature;
use playline_api::{create_router, ApiConfig, AppState};
use playline_firestore::{FirestoreClient, FirestoreConfig};

const DOCUMENTS_ROOT: &str = "/v1/projects/test-project/databases/(default)/documents";
const SECRET_KEY: &str = "test-secret-key";

async fn app_for(server: &MockServer) -> axum::Router {
    let firestore = FirestoreClient::new(FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: playline_firestore::retry::RetryConfig {
            max_retries: 1,
            base_delay_ms: 10,
            max_delay_ms: 50,
        },
        emulator_host: Some(server.uri()),
    })
    .await
    .unwrap();

    let state = AppState::with_client(ApiConfig::default(), firestore, SECRET_KEY.to_string());
    create_router(state, None)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_doc_json(token: &str, video_id: &str, user_session: &str, events: Value) -> Value {
    json!({
        "name": format!("projects/test-project/databases/(default)/documents/interactionSessions/{token}"),
        "fields": {
            "videoId": {"stringValue": video_id},
            "userSession": {"stringValue": user_session},
            "ts": {"timestampValue": "2026-01-01T00:00:00+00:00"},
            "interactions": {"arrayValue": {"values": events}}
        }
    })
}

fn event_tuple_json(ts: f64, kind: &str, tc: f64, last_tc: f64) -> Value {
    json!({"arrayValue": {"values": [
        {"doubleValue": ts},
        {"stringValue": kind},
        {"doubleValue": tc},
        {"doubleValue": last_tc}
    ]}})
}

// ============================================================================
// Aggregate
// ============================================================================

#[tokio::test]
async fn test_aggregate_happy_path() {
    let server = MockServer::start().await;

    // Two sessions: one watched 0..9.5, one only liked a point.
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": session_doc_json("tok-1", "vid-1", "u-1", json!([
                event_tuple_json(0.0, "PLAYING", 0.0, 0.0),
                event_tuple_json(5.0, "PAUSED", 9.5, 9.5)
            ]))},
            {"document": session_doc_json("tok-2", "vid-1", "u-2", json!([
                event_tuple_json(1.0, "LIKE", 4.0, 4.0)
            ]))}
        ])))
        .mount(&server)
        .await;

    // The requesting user's durable like ledger.
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/userSessions/u-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": {
                "likes": {"mapValue": {"fields": {
                    "vid-1": {"arrayValue": {"values": [{"doubleValue": 7.5}]}}
                }}}
            }
        })))
        .mount(&server)
        .await;

    // One stored annotation.
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/mca/vid-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": {
                "mca-curveA": {"mapValue": {"fields": {
                    "type": {"stringValue": "curve"},
                    "data": {"arrayValue": {"values": [{"doubleValue": 0.0}, {"doubleValue": 1.0}]}},
                    "weight": {"doubleValue": 1.0}
                }}}
            }
        })))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/videos/vid-1/aggregate")
                .header("x-user-session", "u-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["numSessions"], 2);
    // The like-only session is omitted from playbacks under the default
    // policy, but still counted and still contributes its liked point.
    assert_eq!(body["playbacks"], json!([[[0.0, 9.5]]]));
    assert_eq!(body["likedPoints"], json!([4.0]));
    assert_eq!(body["myLikes"], json!([7.5]));
    assert_eq!(body["mca"]["curveA"]["type"], "curve");
}

#[tokio::test]
async fn test_aggregate_unknown_video_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"readTime": "2026-01-01T00:00:00Z"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/mca/no-such-video")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/videos/no-such-video/aggregate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["numSessions"], 0);
    assert_eq!(body["playbacks"], json!([]));
    assert_eq!(body["likedPoints"], json!([]));
    assert_eq!(body["myLikes"], json!([]));
    assert_eq!(body["mca"], json!({}));
}

// ============================================================================
// Session Issuance and Event Submission
// ============================================================================

#[tokio::test]
async fn test_user_session_and_session_issuance() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}/userSessions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user-session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let user_session = body["userSession"].as_str().unwrap().to_string();
    assert_eq!(user_session.len(), 32);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header("content-type", "application/json")
                .header("x-user-session", &user_session)
                .body(Body::from(r#"{"videoId":"vid-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn test_create_session_requires_identity() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"videoId":"vid-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_events_appends_and_mirrors_likes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions/tok-1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_doc_json("tok-1", "vid-1", "u-1", json!([]))),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions/tok-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    // Like mirroring: ledger read plus patch.
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/userSessions/u-1")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS_ROOT}/userSessions/u-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let body = json!({
        "interactions": [
            [0.0, "PLAYING", 0.0, 0.0],
            [2.0, "LIKE", 1.5, 1.5],
            [5.0, "PAUSED", 4.0, 4.0]
        ]
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions/tok-1/events")
                .header("content-type", "application/json")
                .header("x-user-session", "u-1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], "ok");
}

#[tokio::test]
async fn test_submit_events_unknown_token_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions/nope")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions/nope/events")
                .header("content-type", "application/json")
                .header("x-user-session", "u-1")
                .body(Body::from(r#"{"interactions":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_events_foreign_token_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions/tok-1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_doc_json("tok-1", "vid-1", "someone-else", json!([]))),
        )
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions/tok-1/events")
                .header("content-type", "application/json")
                .header("x-user-session", "u-1")
                .body(Body::from(r#"{"interactions":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_post_mca_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS_ROOT}/mca/vid-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let body = json!({
        "videoId": "vid-1",
        "mcaName": "curveA",
        "mcaType": "curve",
        "mcaData": [0.0, 0.5, 1.0],
        "mcaWeight": 2.0
    })
    .to_string();
    let signature = compute_signature(SECRET_KEY, body.as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/mca?s={signature}"))
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], "ok");
}

#[tokio::test]
async fn test_post_mca_rejects_bad_signature() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let body = json!({"videoId": "vid-1", "mcaName": "a", "delete": true}).to_string();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/mca?s=deadbeef")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // No store call was made.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_download_returns_legacy_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": session_doc_json("tok-1", "vid-1", "u-1", json!([
                event_tuple_json(0.0, "PLAYING", 0.0, 0.0)
            ]))}
        ])))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let body = json!({"videoId": "vid-1", "cmd": "download"}).to_string();
    let signature = compute_signature(SECRET_KEY, body.as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/interactions?s={signature}"))
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["_id"], "tok-1");
    assert_eq!(sessions[0]["videoId"], "vid-1");
    assert_eq!(sessions[0]["interactions"], json!([[0.0, "PLAYING", 0.0, 0.0]]));
}

#[tokio::test]
async fn test_admin_upload_reports_skipped_sessions() {
    let server = MockServer::start().await;
    // The only import attempt hits a token collision.
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS_ROOT}/interactionSessions")))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let body = json!({
        "videoId": "vid-1",
        "cmd": "upload",
        "data": [
            {"_id": "dup-1", "videoId": "vid-1", "userSession": "u-1",
             "ts": "2026-01-01T00:00:00Z", "interactions": []},
            {"_id": "stray-1", "videoId": "other-video", "userSession": "u-1",
             "ts": "2026-01-01T00:00:00Z", "interactions": []}
        ]
    })
    .to_string();
    let signature = compute_signature(SECRET_KEY, body.as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/interactions?s={signature}"))
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], "ok");
    assert_eq!(body["skipped"]["duplicates"], json!(["dup-1"]));
    assert_eq!(body["skipped"]["wrong_videoid"], json!(["stray-1"]));
}

#[tokio::test]
async fn test_key_check() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let good = json!({
        "msg": "hello",
        "sig": compute_signature(SECRET_KEY, b"hello")
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/key/test")
                .header("content-type", "application/json")
                .body(Body::from(good.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["ok"], "ok");

    let bad = json!({"msg": "hello", "sig": "deadbeef"});
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/key/test")
                .header("content-type", "application/json")
                .body(Body::from(bad.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["ok"], "no");
}
