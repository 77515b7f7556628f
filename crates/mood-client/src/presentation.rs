//! What the session loop tells the display.

use crate::geometry::{Dimensions, PixelBox};

/// Shown in place of the player when a track cannot be embedded.
pub const TRACK_UNAVAILABLE: &str = "Track unavailable. Please try a different emotion or genre.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NowPlaying {
    #[default]
    Nothing,
    Track(String),
    Unavailable,
}

impl NowPlaying {
    /// Embed `uri` in the player. Anything but an http(s) URL cannot be
    /// embedded and shows the fallback message.
    pub fn embed(uri: &str) -> Self {
        match reqwest::Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => NowPlaying::Track(uri.to_string()),
            _ => NowPlaying::Unavailable,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            NowPlaying::Track(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            NowPlaying::Nothing => "",
            NowPlaying::Track(uri) => uri,
            NowPlaying::Unavailable => TRACK_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    /// Face box in surface coordinates, labelled with the dominant emotion.
    Face {
        pixel_box: PixelBox,
        label: String,
        surface: Dimensions,
    },
    Clear,
}

/// Broadcast from the session loop to whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Started,
    Stopped,
    Emotion(String),
    Overlay(Overlay),
    /// First URI of a fresh playlist; the renderer embeds it.
    Track(String),
    Genre(String),
    AutoRefresh(bool),
    Alert(String),
}
