//! User intents and their pure handlers.
//!
//! Each handler takes the current state and returns the next state plus at
//! most one effect for the session loop to carry out.

use crate::state::UiState;

pub const MANUAL_REFRESH_BLOCKED: &str =
    "Please select a genre and ensure emotion detection is active";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ToggleAutoRefresh,
    SelectGenre(String),
    ManualRefresh,
}

/// What caused a playlist request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    EmotionChange,
    GenreChange,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistQuery {
    pub emotion: String,
    pub genre: String,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    RequestPlaylist(PlaylistQuery),
    /// Blocking validation message for the user.
    Alert(String),
}

pub fn reduce(mut state: UiState, intent: Intent) -> (UiState, Effect) {
    let effect = match intent {
        Intent::ToggleAutoRefresh => {
            let enabled = !state.auto_refresh();
            state.set_auto_refresh(enabled);
            Effect::None
        }
        Intent::SelectGenre(genre) => {
            state.select_genre(&genre);
            if state.has_known_emotion() && state.auto_refresh() {
                Effect::RequestPlaylist(PlaylistQuery {
                    emotion: state.current_emotion().to_string(),
                    genre,
                    trigger: Trigger::GenreChange,
                })
            } else {
                Effect::None
            }
        }
        Intent::ManualRefresh => match state.selected_genre() {
            Some(genre) if state.has_known_emotion() => Effect::RequestPlaylist(PlaylistQuery {
                emotion: state.current_emotion().to_string(),
                genre: genre.to_string(),
                trigger: Trigger::Manual,
            }),
            _ => Effect::Alert(MANUAL_REFRESH_BLOCKED.to_string()),
        },
    };
    (state, effect)
}
