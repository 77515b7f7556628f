//! SessionCore: single-owner event loop for the emotion → playlist session.
//!
//! Every input (poll ticks, detection results, backend responses, user
//! intents, surface resizes) arrives as a `SessionEvent` on one mpsc channel.
//! SessionCore owns `UiState` and the video source exclusively; detection and
//! playlist calls run on spawned tasks and report back through the same
//! channel, tagged with sequence numbers so late results can be dropped.
//!
//! Observable changes go out as `SessionUpdate`s on a broadcast channel.

use std::sync::Arc;

use mood_proto::protocol::NO_FACE;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use crate::camera::VideoSource;
use crate::client::PlaylistBackend;
use crate::controls::{reduce, Effect, Intent, PlaylistQuery, Trigger};
use crate::detection::{Detector, FaceDetection, ModelCapability};
use crate::error::{BackendRequestError, DetectionCallError};
use crate::gate::EmotionGate;
use crate::geometry::{map_to_display, Dimensions};
use crate::presentation::{Overlay, SessionUpdate};
use crate::state::UiState;

// ── SessionEvent ──────────────────────────────────────────────────────────────

/// All inputs into the SessionCore loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// Poll period elapsed.
    Tick,
    /// A detection call finished.
    DetectionDone {
        seq: u64,
        result: Result<Option<FaceDetection>, DetectionCallError>,
    },
    /// A playlist request finished.
    PlaylistDone {
        seq: u64,
        query: PlaylistQuery,
        result: Result<Vec<String>, BackendRequestError>,
    },
    Intent(Intent),
    /// The overlay surface changed size.
    Resize(Dimensions),
    Stop,
}

/// External collaborators driven by the loop.
pub struct Collaborators {
    pub detector: Arc<dyn Detector>,
    pub backend: Arc<dyn PlaylistBackend>,
    pub video: Box<dyn VideoSource>,
}

// ── SessionCore ───────────────────────────────────────────────────────────────

pub struct SessionCore {
    state: UiState,
    gate: EmotionGate,
    capability: ModelCapability,
    detector: Arc<dyn Detector>,
    backend: Arc<dyn PlaylistBackend>,
    video: Box<dyn VideoSource>,
    /// Overlay surface size used for box mapping.
    display: Dimensions,
    event_tx: mpsc::Sender<SessionEvent>,
    update_tx: broadcast::Sender<SessionUpdate>,
    /// Sequence number of the detection call in flight, if any.
    detection_in_flight: Option<u64>,
    detection_seq: u64,
    last_applied_detection: u64,
    request_seq: u64,
}

impl SessionCore {
    pub fn new(
        gate: EmotionGate,
        capability: ModelCapability,
        collaborators: Collaborators,
        display: Dimensions,
        event_tx: mpsc::Sender<SessionEvent>,
        update_tx: broadcast::Sender<SessionUpdate>,
    ) -> Self {
        Self {
            state: UiState::default(),
            gate,
            capability,
            detector: collaborators.detector,
            backend: collaborators.backend,
            video: collaborators.video,
            display,
            event_tx,
            update_tx,
            detection_in_flight: None,
            detection_seq: 0,
            last_applied_detection: 0,
            request_seq: 0,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn detection_in_flight(&self) -> bool {
        self.detection_in_flight.is_some()
    }

    /// Run until `Stop` arrives or every sender is gone, then release the camera.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<SessionEvent>) {
        info!("SessionCore: starting event loop");
        self.publish(SessionUpdate::Started);
        self.publish_snapshot();

        while let Some(evt) = event_rx.recv().await {
            if !self.handle(evt) {
                info!("SessionCore: stop requested");
                break;
            }
        }

        self.shutdown();
    }

    /// Apply one event. Returns false when the loop should stop.
    pub fn handle(&mut self, evt: SessionEvent) -> bool {
        match evt {
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::DetectionDone { seq, result } => self.on_detection(seq, result),
            SessionEvent::PlaylistDone { seq, query, result } => {
                self.on_playlist(seq, query, result)
            }
            SessionEvent::Intent(intent) => self.on_intent(intent),
            SessionEvent::Resize(dims) => {
                debug!("Overlay surface resized to {}x{}", dims.width, dims.height);
                self.display = dims;
            }
            SessionEvent::Stop => return false,
        }
        true
    }

    pub fn shutdown(&mut self) {
        self.video.release();
        self.publish(SessionUpdate::Stopped);
        info!("SessionCore: camera released");
    }

    // ── Detection poller ──────────────────────────────────────────────────────

    fn on_tick(&mut self) {
        if let ModelCapability::Unavailable(reason) = &self.capability {
            debug!("Detection model unavailable ({}), skipping tick", reason);
            return;
        }
        if let Some(seq) = self.detection_in_flight {
            trace!("Detection #{} still pending, skipping tick", seq);
            return;
        }
        if !self.video.is_ready() {
            trace!("Video source not ready, skipping tick");
            return;
        }
        let Some(frame) = self.video.capture() else {
            trace!("No frame captured, skipping tick");
            return;
        };

        self.detection_seq += 1;
        let seq = self.detection_seq;
        self.detection_in_flight = Some(seq);

        let detector = Arc::clone(&self.detector);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = detector.detect_one(&frame).await;
            let _ = tx.send(SessionEvent::DetectionDone { seq, result }).await;
        });
    }

    fn on_detection(
        &mut self,
        seq: u64,
        result: Result<Option<FaceDetection>, DetectionCallError>,
    ) {
        if self.detection_in_flight == Some(seq) {
            self.detection_in_flight = None;
        }
        if seq <= self.last_applied_detection {
            debug!("Dropping out-of-order detection #{}", seq);
            return;
        }
        self.last_applied_detection = seq;

        let face = match result {
            Ok(face) => face,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        let dominant = face.as_ref().and_then(|f| {
            f.dominant_emotion()
                .map(|(label, _)| (f.bbox, label.to_string()))
        });

        let Some((bbox, label)) = dominant else {
            if self.state.clear_emotion() {
                self.publish(SessionUpdate::Emotion(NO_FACE.to_string()));
            }
            self.publish(SessionUpdate::Overlay(Overlay::Clear));
            return;
        };

        if self.state.set_current_emotion(&label) {
            self.publish(SessionUpdate::Emotion(label.clone()));
        }

        let overlay = match map_to_display(bbox, self.video.dimensions(), self.display) {
            Some(pixel_box) => Overlay::Face {
                pixel_box,
                label: label.clone(),
                surface: self.display,
            },
            None => Overlay::Clear,
        };
        self.publish(SessionUpdate::Overlay(overlay));

        if !self.gate.should_notify(&self.state, &label) {
            return;
        }
        if let Some(genre) = self.state.selected_genre().map(str::to_string) {
            info!("Emotion changed to {} - updating playlist", label);
            self.issue_request(PlaylistQuery {
                emotion: label,
                genre,
                trigger: Trigger::EmotionChange,
            });
        }
    }

    // ── Controls ──────────────────────────────────────────────────────────────

    fn on_intent(&mut self, intent: Intent) {
        debug!("Intent: {:?}", intent);
        let prev_genre = self.state.selected_genre().map(str::to_string);
        let prev_auto = self.state.auto_refresh();

        let (next, effect) = reduce(std::mem::take(&mut self.state), intent);
        self.state = next;

        if let Some(genre) = self.state.selected_genre() {
            if prev_genre.as_deref() != Some(genre) {
                info!("Genre selected: {}", genre);
                self.publish(SessionUpdate::Genre(genre.to_string()));
            }
        }
        if self.state.auto_refresh() != prev_auto {
            let enabled = self.state.auto_refresh();
            info!("Auto-refresh: {}", if enabled { "enabled" } else { "disabled" });
            self.publish(SessionUpdate::AutoRefresh(enabled));
        }

        match effect {
            Effect::None => {}
            Effect::RequestPlaylist(query) => self.issue_request(query),
            Effect::Alert(message) => {
                warn!("{}", message);
                self.publish(SessionUpdate::Alert(message));
            }
        }
    }

    // ── Playlist requests ─────────────────────────────────────────────────────

    fn issue_request(&mut self, query: PlaylistQuery) {
        self.request_seq += 1;
        let seq = self.request_seq;
        self.state.begin_request(&query.emotion, seq);
        debug!(
            "Playlist request #{} ({:?}) emotion={} genre={}",
            seq, query.trigger, query.emotion, query.genre
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch(&query.emotion, &query.genre).await;
            let _ = tx.send(SessionEvent::PlaylistDone { seq, query, result }).await;
        });
    }

    fn on_playlist(
        &mut self,
        seq: u64,
        query: PlaylistQuery,
        result: Result<Vec<String>, BackendRequestError>,
    ) {
        if !self.state.complete_request(seq, result.is_ok()) {
            debug!("Ignoring stale playlist response #{}", seq);
            return;
        }

        match result {
            Ok(playlist) => match playlist.into_iter().next() {
                Some(uri) => {
                    info!("Now playing {} ({} / {})", uri, query.emotion, query.genre);
                    self.publish(SessionUpdate::Track(uri));
                }
                None => {
                    info!(
                        "Empty playlist for {} / {}, keeping current track",
                        query.emotion, query.genre
                    );
                }
            },
            Err(e) => {
                error!("{} ({} / {})", e, query.emotion, query.genre);
            }
        }
    }

    /// Current state in full, so a renderer that reset on `Started` catches up.
    fn publish_snapshot(&self) {
        self.publish(SessionUpdate::Emotion(self.state.current_emotion().to_string()));
        self.publish(SessionUpdate::AutoRefresh(self.state.auto_refresh()));
        if let Some(genre) = self.state.selected_genre() {
            self.publish(SessionUpdate::Genre(genre.to_string()));
        }
    }

    fn publish(&self, update: SessionUpdate) {
        // No subscribers is fine
        let _ = self.update_tx.send(update);
    }
}
