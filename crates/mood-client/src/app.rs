//! App: terminal front end for a moodplay session.
//!
//! Architecture:
//! - `App` owns the `SessionHandle` (when running) and a `ViewState` mirror of
//!   what the session has broadcast.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks: terminal input, session updates, and start results.
//! - The event loop draws each frame, then awaits the next message.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use ratatui::crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Rectangle},
        Block, Borders, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use mood_client::client::PlaylistBackend;
use mood_client::controls::Intent;
use mood_client::error::StartError;
use mood_client::geometry::Dimensions;
use mood_client::presentation::{NowPlaying, Overlay, SessionUpdate};
use mood_client::replay::{ReplayDetector, SyntheticCamera};
use mood_client::session::{self, SessionHandle, StartControl};
use mood_proto::config::Config;
use mood_proto::protocol::DEFAULT_EMOTION;

use crate::action::Action;
use crate::theme::{
    C_ACCENT, C_CONNECTING, C_ERROR, C_FACE, C_MUTED, C_NUMBER_HINT, C_PANEL_BORDER, C_PLAYING,
    C_PRIMARY, C_SECONDARY, C_TAG,
};

const MAX_LOG_LINES: usize = 200;
/// Genres reachable through keys `1`-`9`.
const MAX_GENRE_KEYS: usize = 9;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Update(SessionUpdate),
    Started(Result<SessionHandle, StartError>),
}

/// What the screen shows; rebuilt from `SessionUpdate`s.
struct ViewState {
    running: bool,
    emotion: String,
    genre: Option<String>,
    auto_refresh: bool,
    overlay: Overlay,
    now_playing: NowPlaying,
    /// Last blocking validation message, cleared by the next key press.
    alert: Option<String>,
    logs: VecDeque<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            running: false,
            emotion: DEFAULT_EMOTION.to_string(),
            genre: None,
            auto_refresh: true,
            overlay: Overlay::Clear,
            now_playing: NowPlaying::Nothing,
            alert: None,
            logs: VecDeque::new(),
        }
    }
}

pub struct App {
    config: Config,
    backend: Arc<dyn PlaylistBackend>,
    update_tx: broadcast::Sender<SessionUpdate>,
    session: Option<SessionHandle>,
    start: StartControl,
    view: ViewState,
    /// Overlay surface size at the last draw.
    surface: Dimensions,
    /// Surface size the session was last told about.
    reported_surface: Dimensions,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        backend: Arc<dyn PlaylistBackend>,
        update_tx: broadcast::Sender<SessionUpdate>,
    ) -> Self {
        Self {
            config,
            backend,
            update_tx,
            session: None,
            start: StartControl::new(),
            view: ViewState::default(),
            surface: Dimensions::default(),
            reported_surface: Dimensions::default(),
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.push_log("moodplay started, press s to start the camera".to_string());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: session updates → AppMessage ─────────────────────
        let mut update_rx = self.update_tx.subscribe();
        let up_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match update_rx.recv().await {
                    Ok(update) => {
                        if up_tx.send(AppMessage::Update(update)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("session update receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;
            self.sync_surface().await;

            let Some(msg) = rx.recv().await else {
                break;
            };
            match msg {
                AppMessage::Event(Event::Key(key)) => {
                    let action = Action::from_key(key);
                    self.dispatch(action, &tx).await;
                }
                AppMessage::Event(_) => {}
                AppMessage::Update(update) => self.apply_update(update),
                AppMessage::Started(result) => self.on_started(result),
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(session) = self.session.take() {
            session.stop().await;
        }
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action, tx: &mpsc::Sender<AppMessage>) {
        if action != Action::Noop {
            self.view.alert = None;
        }
        match action {
            Action::Start => self.begin_start(tx),
            Action::Stop => {
                if let Some(session) = self.session.take() {
                    session.stop().await;
                    self.start.stopped();
                    self.push_log("Camera stopped".to_string());
                }
            }
            Action::SelectGenre(idx) => match self.config.catalog.genres.get(idx).cloned() {
                Some(genre) => self.send_intent(Intent::SelectGenre(genre)).await,
                None => debug!("No genre bound to slot {}", idx + 1),
            },
            Action::ToggleAutoRefresh => self.send_intent(Intent::ToggleAutoRefresh).await,
            Action::ManualRefresh => self.send_intent(Intent::ManualRefresh).await,
            Action::CopyTrack => self.copy_track(),
            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    fn begin_start(&mut self, tx: &mpsc::Sender<AppMessage>) {
        if !self.start.begin() {
            debug!("Start ignored, already starting or running");
            return;
        }
        self.push_log("Starting camera…".to_string());

        let config = self.config.clone();
        let backend = Arc::clone(&self.backend);
        let update_tx = self.update_tx.clone();
        let display = self.surface;
        let tx = tx.clone();
        tokio::spawn(async move {
            let camera =
                SyntheticCamera::new(Dimensions::new(config.camera.width, config.camera.height));
            let result = session::start(
                &config,
                &camera,
                ReplayDetector::new(),
                backend,
                display,
                update_tx,
            )
            .await;
            let _ = tx.send(AppMessage::Started(result)).await;
        });
    }

    fn on_started(&mut self, result: Result<SessionHandle, StartError>) {
        self.start.finish(&result);
        match result {
            Ok(handle) => {
                info!("Session started");
                self.session = Some(handle);
                self.reported_surface = self.surface;
                // Session fields are owned by the update stream, which may
                // already be ahead of this message
                self.view.running = true;
                self.push_log("Webcam stream started".to_string());
            }
            Err(e) => {
                error!("Startup error: {}", e);
                self.push_log(e.user_message());
            }
        }
    }

    async fn send_intent(&mut self, intent: Intent) {
        let Some(session) = &self.session else {
            self.push_log("Start the camera first (press s)".to_string());
            return;
        };
        if !session.send(intent).await {
            warn!("Session loop has ended");
            self.session = None;
            self.start.stopped();
        }
    }

    fn copy_track(&mut self) {
        let Some(uri) = self.view.now_playing.uri().map(str::to_string) else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(uri.clone())) {
            Ok(()) => self.push_log(format!("Copied {}", uri)),
            Err(e) => {
                warn!("Clipboard error: {}", e);
                self.push_log(format!("Clipboard unavailable: {}", e));
            }
        }
    }

    /// Tell the session when the overlay surface changed size.
    async fn sync_surface(&mut self) {
        if self.surface == self.reported_surface {
            return;
        }
        if let Some(session) = &self.session {
            session.resize(self.surface).await;
            self.reported_surface = self.surface;
        }
    }

    // ── Session updates ───────────────────────────────────────────────────────

    fn apply_update(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::Started => {
                // A fresh session follows with its own snapshot
                let logs = std::mem::take(&mut self.view.logs);
                let now_playing = std::mem::take(&mut self.view.now_playing);
                self.view = ViewState {
                    running: true,
                    logs,
                    now_playing,
                    ..ViewState::default()
                };
            }
            SessionUpdate::Stopped => {
                self.view.running = false;
                self.view.overlay = Overlay::Clear;
            }
            SessionUpdate::Emotion(emotion) => self.view.emotion = emotion,
            SessionUpdate::Overlay(overlay) => self.view.overlay = overlay,
            SessionUpdate::Track(uri) => {
                self.view.now_playing = NowPlaying::embed(&uri);
                if self.view.now_playing == NowPlaying::Unavailable {
                    warn!("Cannot embed track {}", uri);
                }
                self.push_log(format!("Playlist updated: {}", uri));
            }
            SessionUpdate::Genre(genre) => self.view.genre = Some(genre),
            SessionUpdate::AutoRefresh(enabled) => {
                if self.view.auto_refresh != enabled {
                    self.push_log(format!(
                        "Auto-refresh {}",
                        if enabled { "enabled" } else { "disabled" }
                    ));
                }
                self.view.auto_refresh = enabled;
            }
            SessionUpdate::Alert(message) => {
                self.push_log(message.clone());
                self.view.alert = Some(message);
            }
        }
    }

    fn push_log(&mut self, message: String) {
        let now = chrono::Local::now();
        self.view
            .logs
            .push_back(format!("{} {}", now.format("%H:%M:%S"), message));
        while self.view.logs.len() > MAX_LOG_LINES {
            self.view.logs.pop_front();
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_header(frame, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);
        self.draw_overlay(frame, body[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(genre_panel_height(self.config.catalog.genres.len())),
                Constraint::Min(3),
            ])
            .split(body[1]);
        self.draw_now_playing(frame, right[0]);
        self.draw_genres(frame, right[1]);
        self.draw_logs(frame, right[2]);

        draw_key_bar(frame, rows[2]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let (state_label, state_color) = if self.view.running {
            ("● LIVE", C_PLAYING)
        } else if !self.start.is_enabled() {
            ("● STARTING", C_CONNECTING)
        } else {
            ("○ STOPPED", C_MUTED)
        };

        let first = Line::from(vec![
            Span::styled(state_label, Style::default().fg(state_color)),
            Span::raw("   emotion: "),
            Span::styled(
                self.view.emotion.clone(),
                Style::default().fg(C_FACE).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   genre: "),
            Span::styled(
                self.view.genre.clone().unwrap_or_else(|| "-".to_string()),
                Style::default().fg(C_TAG),
            ),
            Span::raw("   auto-refresh: "),
            Span::styled(
                if self.view.auto_refresh { "on" } else { "off" },
                Style::default().fg(C_SECONDARY),
            ),
        ]);

        let second = match (&self.view.alert, self.start.status()) {
            (Some(alert), _) => Line::from(Span::styled(alert.clone(), Style::default().fg(C_ACCENT))),
            (None, Some(status)) => {
                Line::from(Span::styled(status.to_string(), Style::default().fg(C_ERROR)))
            }
            (None, None) => Line::default(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(" moodplay ");
        frame.render_widget(Paragraph::new(vec![first, second]).block(block), area);
    }

    fn draw_overlay(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(" camera ");
        let inner = block.inner(area);
        self.surface = Dimensions::new(inner.width as u32, inner.height as u32);

        let width = inner.width as f64;
        let height = inner.height as f64;
        let overlay = &self.view.overlay;
        let canvas = Canvas::default()
            .block(block)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                if let Overlay::Face {
                    pixel_box,
                    label,
                    surface,
                } = overlay
                {
                    // Canvas y grows upward; surface y grows downward
                    let top = surface.height as f64 - pixel_box.y as f64;
                    ctx.draw(&Rectangle {
                        x: pixel_box.x as f64,
                        y: top - pixel_box.height as f64,
                        width: pixel_box.width as f64,
                        height: pixel_box.height as f64,
                        color: C_FACE,
                    });
                    ctx.print(
                        pixel_box.x as f64,
                        top + 1.0,
                        Span::styled(label.clone(), Style::default().fg(C_FACE)),
                    );
                }
            });
        frame.render_widget(canvas, area);
    }

    fn draw_now_playing(&self, frame: &mut Frame, area: Rect) {
        let style = match self.view.now_playing {
            NowPlaying::Unavailable => Style::default().fg(C_SECONDARY),
            _ => Style::default().fg(C_PRIMARY),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(" now playing ");
        let text = Paragraph::new(Span::styled(
            self.view.now_playing.display_text().to_string(),
            style,
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(text, area);
    }

    fn draw_genres(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .config
            .catalog
            .genres
            .iter()
            .take(MAX_GENRE_KEYS)
            .enumerate()
            .map(|(i, genre)| {
                let selected = self.view.genre.as_deref() == Some(genre.as_str());
                let style = if selected {
                    Style::default().fg(C_TAG).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(C_PRIMARY)
                };
                Line::from(vec![
                    Span::styled(format!("{} ", i + 1), Style::default().fg(C_NUMBER_HINT)),
                    Span::styled(genre.clone(), style),
                ])
            })
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(" genre ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_logs(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.view.logs.len().saturating_sub(visible);
        let lines: Vec<Line> = self
            .view
            .logs
            .iter()
            .skip(skip)
            .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(C_SECONDARY))))
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(" log ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Rows for the genre panel: one per bound genre plus borders.
fn genre_panel_height(genres: usize) -> u16 {
    genres.min(MAX_GENRE_KEYS) as u16 + 2
}

fn draw_key_bar(frame: &mut Frame, area: Rect) {
    let keys = [
        ("s", "start"),
        ("x", "stop"),
        ("1-9", "genre"),
        ("a", "auto-refresh"),
        ("r", "refresh"),
        ("y", "copy"),
        ("q", "quit"),
    ];
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), Style::default().fg(C_ACCENT)));
        spans.push(Span::styled(format!("{} ", label), Style::default().fg(C_MUTED)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mood_client::error::BackendRequestError;
    use std::io::Write;
    use std::time::Duration;
    use tokio::time::{timeout_at, Instant};

    struct SilentBackend;

    #[async_trait]
    impl PlaylistBackend for SilentBackend {
        async fn fetch(&self, _: &str, _: &str) -> Result<Vec<String>, BackendRequestError> {
            Ok(Vec::new())
        }
    }

    fn app(config: Config) -> App {
        let (update_tx, _) = broadcast::channel(256);
        App::new(config, Arc::new(SilentBackend), update_tx)
    }

    /// Apply session updates as they arrive for `window`.
    async fn pump(app: &mut App, updates: &mut broadcast::Receiver<SessionUpdate>, window: Duration) {
        let deadline = Instant::now() + window;
        while let Ok(res) = timeout_at(deadline, updates.recv()).await {
            match res {
                Ok(update) => app.apply_update(update),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    #[tokio::test]
    async fn test_start_result_after_updates_keeps_emotion() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        write!(
            script,
            r#"[{{"box":{{"x":10,"y":10,"width":50,"height":50}},"expressions":{{"happy":0.9}}}}]"#
        )
        .unwrap();
        let mut config = Config::default();
        config.model.source_uri = script.path().to_str().unwrap().to_string();
        config.poller.interval_ms = 10;

        let mut app = app(config.clone());
        let mut updates = app.update_tx.subscribe();
        assert!(app.start.begin());
        let result = session::start(
            &config,
            &SyntheticCamera::new(Dimensions::new(640, 480)),
            ReplayDetector::new(),
            Arc::clone(&app.backend),
            Dimensions::new(80, 24),
            app.update_tx.clone(),
        )
        .await;

        // The live session reports before the start result is handled
        pump(&mut app, &mut updates, Duration::from_millis(100)).await;
        assert_eq!(app.view.emotion, "happy");

        app.on_started(result);
        assert!(app.view.running);
        assert!(app.session.is_some());

        pump(&mut app, &mut updates, Duration::from_millis(100)).await;
        assert_eq!(app.view.emotion, "happy");

        if let Some(session) = app.session.take() {
            session.stop().await;
        }
    }

    #[test]
    fn test_started_update_resets_then_snapshot_restores() {
        let mut app = app(Config::default());
        app.apply_update(SessionUpdate::Emotion("sad".into()));
        app.apply_update(SessionUpdate::Genre("rock".into()));

        app.apply_update(SessionUpdate::Started);
        assert_eq!(app.view.emotion, DEFAULT_EMOTION);
        assert_eq!(app.view.genre, None);

        app.apply_update(SessionUpdate::Emotion("happy".into()));
        app.apply_update(SessionUpdate::AutoRefresh(true));
        assert_eq!(app.view.emotion, "happy");
        assert!(app.view.auto_refresh);
        assert!(app.view.running);
    }

    #[test]
    fn test_genre_panel_height_matches_bound_keys() {
        assert_eq!(genre_panel_height(0), 2);
        assert_eq!(genre_panel_height(5), 7);
        assert_eq!(genre_panel_height(12), 11);
    }
}
