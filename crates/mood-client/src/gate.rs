//! Emotion change gate: decides whether an observation triggers a request.

use crate::state::UiState;

#[derive(Debug, Clone)]
pub struct EmotionGate {
    excluded: Vec<String>,
}

impl Default for EmotionGate {
    fn default() -> Self {
        Self::new(vec!["surprised".to_string()])
    }
}

impl EmotionGate {
    pub fn new(excluded: Vec<String>) -> Self {
        Self { excluded }
    }

    pub fn is_excluded(&self, label: &str) -> bool {
        self.excluded.iter().any(|e| e == label)
    }

    /// Whether `observed` should trigger an automatic playlist request.
    pub fn should_notify(&self, state: &UiState, observed: &str) -> bool {
        if self.is_excluded(observed) {
            return false;
        }
        if state.last_emotion_sent() == Some(observed) {
            return false;
        }
        // Already requesting this emotion
        if state.pending_emotion() == Some(observed) {
            return false;
        }
        state.auto_refresh() && state.selected_genre().is_some()
    }
}
