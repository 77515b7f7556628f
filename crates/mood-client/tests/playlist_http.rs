//! HttpPlaylistClient against an in-process playlist server.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use mood_client::client::{HttpPlaylistClient, PlaylistBackend};
use mood_client::error::BackendRequestError;
use mood_proto::config::BackendConfig;
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<Value>>>;

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: String) -> HttpPlaylistClient {
    HttpPlaylistClient::new(&BackendConfig {
        base_url,
        timeout_ms: 2000,
    })
    .unwrap()
}

async fn recording_handler(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body);
    Json(json!({ "playlist": ["uri1", "uri2"] }))
}

#[tokio::test]
async fn test_fetch_posts_emotion_and_genre() {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route("/get_playlist", post(recording_handler))
        .with_state(seen.clone());
    let client = client_for(serve(router).await);

    let playlist = client.fetch("sad", "rock").await.unwrap();

    assert_eq!(playlist, vec!["uri1".to_string(), "uri2".to_string()]);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[json!({ "emotion": "sad", "genre": "rock" })]
    );
}

#[tokio::test]
async fn test_missing_playlist_field_is_empty() {
    let router = Router::new().route("/get_playlist", post(|| async { Json(json!({})) }));
    let client = client_for(serve(router).await);

    assert_eq!(client.fetch("happy", "pop").await.unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let router = Router::new().route(
        "/get_playlist",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = client_for(serve(router).await);

    assert_eq!(
        client.fetch("happy", "pop").await,
        Err(BackendRequestError::Status(500))
    );
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode() {
    let router = Router::new().route("/get_playlist", post(|| async { "not json" }));
    let client = client_for(serve(router).await);

    match client.fetch("happy", "pop").await {
        Err(BackendRequestError::Decode(_)) => {}
        other => panic!("expected decode error, got {:?}", other),
    }
}
