//! Session/UI state. Owned by the session loop; everything else sees copies.

use mood_proto::protocol::{DEFAULT_EMOTION, NO_FACE};

/// Where the request-trigger lifecycle currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    /// A playlist request for `emotion` is in flight, tagged `seq`.
    Requesting { emotion: String, seq: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    current_emotion: String,
    selected_genre: Option<String>,
    last_emotion_sent: Option<String>,
    auto_refresh: bool,
    phase: RequestPhase,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_emotion: DEFAULT_EMOTION.to_string(),
            selected_genre: None,
            last_emotion_sent: None,
            auto_refresh: true,
            phase: RequestPhase::Idle,
        }
    }
}

impl UiState {
    pub fn current_emotion(&self) -> &str {
        &self.current_emotion
    }

    /// False while no face is in view.
    pub fn has_known_emotion(&self) -> bool {
        self.current_emotion != NO_FACE
    }

    pub fn selected_genre(&self) -> Option<&str> {
        self.selected_genre.as_deref()
    }

    pub fn last_emotion_sent(&self) -> Option<&str> {
        self.last_emotion_sent.as_deref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn phase(&self) -> &RequestPhase {
        &self.phase
    }

    /// Emotion of the in-flight request, if any.
    pub fn pending_emotion(&self) -> Option<&str> {
        match &self.phase {
            RequestPhase::Idle => None,
            RequestPhase::Requesting { emotion, .. } => Some(emotion.as_str()),
        }
    }

    /// Returns true when the value changed.
    pub fn set_current_emotion(&mut self, emotion: &str) -> bool {
        if self.current_emotion == emotion {
            return false;
        }
        self.current_emotion = emotion.to_string();
        true
    }

    pub fn clear_emotion(&mut self) -> bool {
        self.set_current_emotion(NO_FACE)
    }

    pub fn select_genre(&mut self, genre: &str) {
        self.selected_genre = Some(genre.to_string());
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn begin_request(&mut self, emotion: &str, seq: u64) {
        self.phase = RequestPhase::Requesting {
            emotion: emotion.to_string(),
            seq,
        };
    }

    /// Settle the request tagged `seq`. Only a success marks the emotion as
    /// sent, so a failed request can be retried by the next observation.
    ///
    /// Returns false when `seq` is not the request in flight (stale).
    pub fn complete_request(&mut self, seq: u64, succeeded: bool) -> bool {
        let emotion = match &self.phase {
            RequestPhase::Requesting { emotion, seq: current } if *current == seq => emotion.clone(),
            _ => return false,
        };
        self.phase = RequestPhase::Idle;
        if succeeded {
            self.last_emotion_sent = Some(emotion);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = UiState::default();
        assert_eq!(s.current_emotion(), "neutral");
        assert!(s.has_known_emotion());
        assert_eq!(s.selected_genre(), None);
        assert_eq!(s.last_emotion_sent(), None);
        assert!(s.auto_refresh());
        assert_eq!(s.phase(), &RequestPhase::Idle);
    }

    #[test]
    fn test_clear_emotion_uses_sentinel() {
        let mut s = UiState::default();
        assert!(s.clear_emotion());
        assert_eq!(s.current_emotion(), "none");
        assert!(!s.has_known_emotion());
        assert!(!s.clear_emotion());
    }

    #[test]
    fn test_success_marks_sent() {
        let mut s = UiState::default();
        s.begin_request("happy", 1);
        assert_eq!(s.pending_emotion(), Some("happy"));
        assert!(s.complete_request(1, true));
        assert_eq!(s.last_emotion_sent(), Some("happy"));
        assert_eq!(s.pending_emotion(), None);
    }

    #[test]
    fn test_failure_does_not_mark_sent() {
        let mut s = UiState::default();
        s.begin_request("happy", 1);
        assert!(s.complete_request(1, false));
        assert_eq!(s.last_emotion_sent(), None);
        assert_eq!(s.phase(), &RequestPhase::Idle);
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut s = UiState::default();
        s.begin_request("happy", 1);
        s.begin_request("sad", 2);
        assert!(!s.complete_request(1, true));
        assert_eq!(s.last_emotion_sent(), None);
        assert_eq!(s.pending_emotion(), Some("sad"));
        assert!(s.complete_request(2, true));
        assert_eq!(s.last_emotion_sent(), Some("sad"));
    }
}
