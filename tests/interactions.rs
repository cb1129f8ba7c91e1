use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;

use listening_party::{
    config::AppConfig,
    dao::kv_store::MemoryKvStore,
    routes,
    services::{
        catalog::StaticCatalog,
        verification::{SIGNATURE_HEADER, SharedSecretVerifier, TIMESTAMP_HEADER},
    },
    state::{AppState, SharedState},
};

const SECRET: &str = "party-secret";
const TRACK: &str = "dQw4w9WgXcQ";

async fn app() -> (Router, SharedState) {
    let config = AppConfig {
        manager_roles: vec!["dj".into()],
        ..AppConfig::default()
    };
    let catalog = StaticCatalog::new().with_track(TRACK, "Anthem");
    let state = AppState::new(
        config,
        Arc::new(catalog),
        Arc::new(SharedSecretVerifier::new(SECRET)),
    );
    state.set_kv_store(Arc::new(MemoryKvStore::new())).await;
    (routes::router(state.clone()), state)
}

fn signed(body: &Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();
    let signature = SharedSecretVerifier::new(SECRET).sign(&timestamp, &bytes);
    Request::post("/interactions")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(TIMESTAMP_HEADER, timestamp)
        .body(Body::from(bytes))
        .unwrap()
}

fn command(user: &str, roles: &[&str], name: &str, options: Value) -> Value {
    json!({
        "user": { "id": user, "roles": roles },
        "kind": { "type": "command", "name": name, "options": options },
    })
}

fn button(user: &str, custom_id: &str) -> Value {
    json!({
        "user": { "id": user },
        "kind": { "type": "component", "custom_id": custom_id },
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn interact(app: &Router, body: Value) -> Value {
    let (status, reply) = send(app, signed(&body)).await;
    assert_eq!(status, StatusCode::OK, "{reply}");
    reply
}

#[tokio::test]
async fn unsigned_or_forged_requests_are_refused() {
    let (app, _state) = app().await;
    let body = command("a", &[], "enter", json!({}));

    let unsigned = Request::post("/interactions")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let (status, _) = send(&app, unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut forged = signed(&body);
    forged
        .headers_mut()
        .insert(SIGNATURE_HEADER, "00".repeat(32).parse().unwrap());
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stale = OffsetDateTime::now_utc().unix_timestamp() - 3_600;
    let bytes = serde_json::to_vec(&body).unwrap();
    let signature = SharedSecretVerifier::new(SECRET).sign(&stale.to_string(), &bytes);
    let replayed = Request::post("/interactions")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(TIMESTAMP_HEADER, stale.to_string())
        .body(Body::from(bytes))
        .unwrap();
    let (status, _) = send(&app, replayed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_listening_round() {
    let (app, _state) = app().await;

    let started = interact(&app, command("host", &["dj"], "session-start", json!({}))).await;
    assert_eq!(started["ephemeral"], false);

    for user in ["alice", "bob"] {
        let joined = interact(&app, command(user, &[], "enter", json!({}))).await;
        assert!(joined["text"].as_str().unwrap().contains(user));
    }

    let playing = interact(
        &app,
        command(
            "host",
            &["dj"],
            "vote-start",
            json!({ "url": format!("https://www.youtube.com/watch?v={TRACK}") }),
        ),
    )
    .await;
    assert!(playing["text"].as_str().unwrap().contains("Anthem"));
    let buttons = playing["options"].as_array().unwrap();
    assert_eq!(buttons.len(), 2);
    assert_eq!(buttons[1]["custom_id"], format!("vote:{TRACK}:2"));

    let cast = interact(&app, button("alice", &format!("vote:{TRACK}:2"))).await;
    assert_eq!(cast["ephemeral"], true);
    interact(&app, button("bob", &format!("vote:{TRACK}:1"))).await;

    let overview = send(&app, Request::get("/party").body(Body::empty()).unwrap()).await;
    assert_eq!(overview.0, StatusCode::OK);
    assert_eq!(overview.1["sessionActive"], true);
    assert_eq!(overview.1["currentSong"]["id"], TRACK);
    assert_eq!(overview.1["participantCount"], 2);

    let closed = interact(&app, command("host", &["dj"], "vote-end", json!({}))).await;
    let text = closed["text"].as_str().unwrap();
    assert!(text.contains("3 points from 2 of 2 listeners"), "{text}");
    assert!(text.contains("1.50 avg"), "{text}");
    assert!(text.contains("The room loved it!"), "{text}");

    let ended = interact(&app, command("host", &["dj"], "session-end", json!({}))).await;
    assert!(ended["text"].as_str().unwrap().contains("1. Anthem"));

    let overview = send(&app, Request::get("/party").body(Body::empty()).unwrap()).await;
    assert_eq!(overview.1["sessionActive"], false);
    assert_eq!(overview.1["participantCount"], 0);
}

#[tokio::test]
async fn rejections_are_ephemeral_replies() {
    let (app, _state) = app().await;

    let reply = interact(&app, command("alice", &[], "enter", json!({}))).await;
    assert_eq!(reply["ephemeral"], true);
    assert_eq!(reply["text"], "No listening session is running.");

    let reply = interact(&app, command("alice", &[], "participants", json!({}))).await;
    assert_eq!(reply["ephemeral"], true);
    assert_eq!(reply["text"], "You are not allowed to do that.");
}

#[tokio::test]
async fn malformed_interactions_are_bad_requests() {
    let (app, _state) = app().await;

    let (status, _) = send(&app, signed(&command("alice", &[], "dance", json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, signed(&button("alice", "vote:only"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        signed(&command("not a valid id!", &[], "enter", json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn degraded_mode_is_reported() {
    let (app, state) = app().await;

    let (status, body) = send(
        &app,
        Request::get("/healthcheck").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");

    state.clear_kv_store().await;

    let (_, body) = send(
        &app,
        Request::get("/healthcheck").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body["status"], "degraded");

    let (status, _) = send(&app, Request::get("/party").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(&app, signed(&command("alice", &[], "enter", json!({})))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
