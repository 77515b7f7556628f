use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use mood_proto::catalog::PlaylistCatalog;
use mood_proto::protocol::{PlaylistRequest, PlaylistResponse, PLAYLIST_PATH};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

#[derive(Clone)]
struct HttpState {
    catalog: Arc<PlaylistCatalog>,
}

pub fn router(catalog: Arc<PlaylistCatalog>) -> Router {
    Router::new()
        .route(PLAYLIST_PATH, post(get_playlist))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(HttpState { catalog })
}

pub fn start_server(
    bind_address: String,
    port: u16,
    catalog: Arc<PlaylistCatalog>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(catalog);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("Playlist API listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_playlist(
    State(state): State<HttpState>,
    Json(req): Json<PlaylistRequest>,
) -> Json<PlaylistResponse> {
    let playlist = state.catalog.lookup(&req.emotion, req.genre.as_deref());
    debug!(
        "HTTP API: playlist for emotion={} genre={:?} -> {} tracks",
        req.emotion,
        req.genre,
        playlist.len()
    );
    Json(PlaylistResponse { playlist })
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use mood_proto::catalog::parse_catalog_from_str;
    use tower::ServiceExt;

    fn app() -> Router {
        let catalog = parse_catalog_from_str(
            r#"
            [playlists]
            neutral = ["n1"]
            sad = ["s1"]
            sad_rock = ["uri1", "uri2"]
            jazz = ["j1"]
            "#,
        )
        .unwrap();
        router(Arc::new(catalog))
    }

    async fn post_json(body: &str) -> (StatusCode, PlaylistResponse) {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(PLAYLIST_PATH)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let parsed = serde_json::from_slice(&bytes).unwrap_or_default();
        (status, parsed)
    }

    #[tokio::test]
    async fn test_combined_key() {
        let (status, resp) = post_json(r#"{"emotion":"sad","genre":"rock"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.playlist, vec!["uri1", "uri2"]);
    }

    #[tokio::test]
    async fn test_genre_and_neutral_fallbacks() {
        let (_, resp) = post_json(r#"{"emotion":"happy","genre":"jazz"}"#).await;
        assert_eq!(resp.playlist, vec!["j1"]);

        let (_, resp) = post_json(r#"{"emotion":"happy","genre":"metal"}"#).await;
        assert_eq!(resp.playlist, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_empty_genre_uses_emotion_key() {
        let (status, resp) = post_json(r#"{"emotion":"sad","genre":""}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.playlist, vec!["s1"]);
    }

    #[tokio::test]
    async fn test_missing_emotion_defaults_to_neutral() {
        let (status, resp) = post_json("{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.playlist, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_rejects_non_json_body() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(PLAYLIST_PATH)
                    .body(Body::from("emotion=sad"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
