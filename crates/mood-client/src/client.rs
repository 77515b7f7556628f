//! Playlist backend client.

use std::time::Duration;

use async_trait::async_trait;
use mood_proto::config::BackendConfig;
use mood_proto::protocol::{PlaylistRequest, PlaylistResponse, PLAYLIST_PATH};
use tracing::debug;

use crate::error::BackendRequestError;

#[async_trait]
pub trait PlaylistBackend: Send + Sync {
    /// Fetch the ordered track URIs for an emotion/genre pair.
    async fn fetch(&self, emotion: &str, genre: &str) -> Result<Vec<String>, BackendRequestError>;
}

/// `POST /get_playlist` over HTTP. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpPlaylistClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPlaylistClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendRequestError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("moodplay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), PLAYLIST_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PlaylistBackend for HttpPlaylistClient {
    async fn fetch(&self, emotion: &str, genre: &str) -> Result<Vec<String>, BackendRequestError> {
        debug!("POST {} emotion={} genre={}", self.endpoint, emotion, genre);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&PlaylistRequest::new(emotion, genre))
            .send()
            .await?
            .error_for_status()?;
        let body: PlaylistResponse = resp.json().await?;
        Ok(body.playlist)
    }
}
