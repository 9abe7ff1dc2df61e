//! Integration tests for the HTTP API.
//!
//! Routes are exercised through `tower::ServiceExt::oneshot` against an
//! in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use p9_server::api::{AppState, create_router};
use play_nine::{
    PlayerId, TableName, TableView,
    game::{Phase, ViewPhase},
    session::{SessionConfig, SessionRegistry},
    store::{MemoryStore, TableStore},
    table::{TableConfig, TableManager},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

struct TestServer {
    app: axum::Router,
    store: Arc<MemoryStore>,
    registry: Arc<SessionRegistry>,
}

/// Helper to create test server over an in-memory store
fn create_test_server() -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
    let table_manager = Arc::new(TableManager::new(
        store.clone(),
        registry.clone(),
        TableConfig::default(),
    ));
    let app = create_router(AppState {
        table_manager,
        registry: registry.clone(),
    });
    TestServer {
        app,
        store,
        registry,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn join(app: &axum::Router, table: &str, player: &str) -> String {
    let (status, body) = post(
        app,
        "/play9/join",
        json!({"table_name": table, "player_name": player}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["player_id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let server = create_test_server();
    let (status, body) = get(&server.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tables"]["active_count"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

// ============================================================================
// Join Tests
// ============================================================================

#[tokio::test]
async fn test_join_normalizes_table_name() {
    let server = create_test_server();
    let (status, body) = post(
        &server.app,
        "/play9/join",
        json!({"table_name": "  Sunday-Game ", "player_name": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table_name"], "sunday-game");
    assert!(body["player_id"].is_string());
}

#[tokio::test]
async fn test_viewer_join_has_no_player_id() {
    let server = create_test_server();
    let (status, body) = post(&server.app, "/play9/join", json!({"table_name": "quiet"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("player_id").is_none());

    let name = TableName::parse("quiet").unwrap();
    assert!(server.store.load(&name).await.unwrap().is_some());
}

#[tokio::test]
async fn test_join_invalid_names() {
    let server = create_test_server();
    let (status, body) = post(
        &server.app,
        "/play9/join",
        json!({"table_name": "bad name!", "player_name": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = post(
        &server.app,
        "/play9/join",
        json!({"table_name": "fine", "player_name": "this name is far too long"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejoin_returns_same_id_unless_connected() {
    let server = create_test_server();
    let first = join(&server.app, "again", "alice").await;
    let second = join(&server.app, "again", "alice").await;
    assert_eq!(first, second);

    let (tx, _rx) = server.registry.channel();
    server
        .registry
        .connect(
            &TableName::parse("again").unwrap(),
            Some(PlayerId::from(first)),
            tx,
        )
        .await
        .unwrap();

    let (status, body) = post(
        &server.app,
        "/play9/join",
        json!({"table_name": "again", "player_name": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Player already connected elsewhere");
}

// ============================================================================
// Lobby Action Tests
// ============================================================================

#[tokio::test]
async fn test_start_and_reveal_flow() {
    let server = create_test_server();
    let alice = join(&server.app, "flow", "alice").await;
    let bob = join(&server.app, "flow", "bob").await;

    let (status, body) = post(
        &server.app,
        "/play9/start",
        json!({"table_name": "flow", "player_id": alice}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    for id in [&alice, &bob] {
        for card_index in [0, 5] {
            let (status, body) = post(
                &server.app,
                "/play9/reveal",
                json!({"table_name": "flow", "player_id": id, "card_index": card_index}),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{body}");
        }
    }

    let table = server
        .store
        .load(&TableName::parse("flow").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.phase, Phase::Play);
}

#[tokio::test]
async fn test_start_errors() {
    let server = create_test_server();
    let alice = join(&server.app, "lonely", "alice").await;

    let (status, body) = post(
        &server.app,
        "/play9/start",
        json!({"table_name": "lonely", "player_id": alice}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Need at least 2 players");

    let (status, _) = post(
        &server.app,
        "/play9/start",
        json!({"table_name": "lonely", "player_id": "stranger"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = post(
        &server.app,
        "/play9/start",
        json!({"table_name": "nowhere", "player_id": alice}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Table not found");
}

#[tokio::test]
async fn test_reveal_twice_same_card() {
    let server = create_test_server();
    let alice = join(&server.app, "twice", "alice").await;
    join(&server.app, "twice", "bob").await;
    post(
        &server.app,
        "/play9/start",
        json!({"table_name": "twice", "player_id": alice}),
    )
    .await;

    let reveal = json!({"table_name": "twice", "player_id": alice, "card_index": 2});
    let (status, _) = post(&server.app, "/play9/reveal", reveal.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post(&server.app, "/play9/reveal", reveal).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Card already face-up");
}

#[tokio::test]
async fn test_leave_last_player_empties_table() {
    let server = create_test_server();
    let alice = join(&server.app, "bye", "alice").await;

    let (status, _) = post(
        &server.app,
        "/play9/leave",
        json!({"table_name": "bye", "player_id": alice}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&server.app, "/play9/api/table/bye").await;
    assert_eq!(status, StatusCode::OK);
    let view: TableView = serde_json::from_value(body).unwrap();
    assert_eq!(view.phase, ViewPhase::Empty);
    assert_eq!(view.draw_pile_count, 108);
}

// ============================================================================
// Table View Tests
// ============================================================================

#[tokio::test]
async fn test_table_view_hides_face_down_cards() {
    let server = create_test_server();
    let alice = join(&server.app, "secret", "alice").await;
    join(&server.app, "secret", "bob").await;
    post(
        &server.app,
        "/play9/start",
        json!({"table_name": "secret", "player_id": alice}),
    )
    .await;

    let (status, body) = get(&server.app, "/play9/api/table/secret").await;
    assert_eq!(status, StatusCode::OK);
    let view: TableView = serde_json::from_value(body).unwrap();
    assert_eq!(view.phase, ViewPhase::Reveal);
    for player in &view.players {
        assert_eq!(player.hand.len(), 8);
        assert!(player.hand.iter().all(|c| !c.face_up && c.value == -99));
    }
    assert_eq!(view.discard_pile_top.len(), 1);
}

#[tokio::test]
async fn test_table_view_unknown_and_invalid() {
    let server = create_test_server();
    let (status, body) = get(&server.app, "/play9/api/table/never-made").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "empty");

    let (status, _) = get(&server.app, "/play9/api/table/NOT%20VALID").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_table_view_lists_connected_players() {
    let server = create_test_server();
    let alice = join(&server.app, "present", "alice").await;
    join(&server.app, "present", "bob").await;

    let (tx, _rx) = server.registry.channel();
    server
        .registry
        .connect(
            &TableName::parse("present").unwrap(),
            Some(PlayerId::from(alice.clone())),
            tx,
        )
        .await
        .unwrap();

    let (_, body) = get(&server.app, "/play9/api/table/present").await;
    assert_eq!(body["active_player_ids"], json!([alice]));
}

#[tokio::test]
async fn test_websocket_route_rejects_invalid_table_name() {
    let server = create_test_server();
    let (status, body) = get(&server.app, "/play9/ws/bad%20name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
