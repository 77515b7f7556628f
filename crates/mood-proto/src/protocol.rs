use serde::{Deserialize, Serialize};

/// Path of the playlist endpoint served by the daemon.
pub const PLAYLIST_PATH: &str = "/get_playlist";

/// Emotion assumed before the first detection and when a request omits one.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Sentinel shown while no face is in view.
pub const NO_FACE: &str = "none";

/// Body of `POST /get_playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRequest {
    #[serde(default = "default_emotion")]
    pub emotion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl PlaylistRequest {
    pub fn new(emotion: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
            genre: Some(genre.into()),
        }
    }
}

/// Response of `POST /get_playlist`: track URIs in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaylistResponse {
    #[serde(default)]
    pub playlist: Vec<String>,
}

fn default_emotion() -> String {
    DEFAULT_EMOTION.to_string()
}
