//! Action enum: user input mapped to session operations.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    /// Genre by position in the configured list (key `1` → 0).
    SelectGenre(usize),
    ToggleAutoRefresh,
    ManualRefresh,
    CopyTrack,
    Quit,
    Noop,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Action::Noop;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => Action::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('s') => Action::Start,
            KeyCode::Char('x') => Action::Stop,
            KeyCode::Char('a') => Action::ToggleAutoRefresh,
            KeyCode::Char('r') => Action::ManualRefresh,
            KeyCode::Char('y') => Action::CopyTrack,
            KeyCode::Char(c @ '1'..='9') => Action::SelectGenre(c as usize - '1' as usize),
            _ => Action::Noop,
        }
    }
}
