//! Starting and stopping a session.

use std::sync::Arc;
use std::time::Duration;

use mood_proto::config::Config;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::camera::CameraAccess;
use crate::client::PlaylistBackend;
use crate::controls::Intent;
use crate::core::{Collaborators, SessionCore, SessionEvent};
use crate::detection::{probe, Detector, ModelCapability};
use crate::error::{ModelUnavailableError, StartError};
use crate::gate::EmotionGate;
use crate::geometry::Dimensions;
use crate::poller::spawn_ticker;
use crate::presentation::SessionUpdate;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Handle to a running session.
pub struct SessionHandle {
    event_tx: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
    core_task: JoinHandle<()>,
    ticker_task: JoinHandle<()>,
}

impl SessionHandle {
    /// Forward a user intent. Returns false if the session has ended.
    pub async fn send(&self, intent: Intent) -> bool {
        self.event_tx.send(SessionEvent::Intent(intent)).await.is_ok()
    }

    pub async fn resize(&self, display: Dimensions) -> bool {
        self.event_tx.send(SessionEvent::Resize(display)).await.is_ok()
    }

    /// Halt polling, end the loop and release the camera.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.event_tx.send(SessionEvent::Stop).await;
        if let Err(e) = self.ticker_task.await {
            error!("Ticker task failed: {}", e);
        }
        if let Err(e) = self.core_task.await {
            error!("Session task failed: {}", e);
        }
        info!("Session stopped");
    }
}

/// Load the model, open the camera and spawn the session loop.
///
/// Model and camera failures are fatal and leave nothing running.
pub async fn start<D>(
    config: &Config,
    camera: &dyn CameraAccess,
    mut detector: D,
    backend: Arc<dyn PlaylistBackend>,
    display: Dimensions,
    update_tx: broadcast::Sender<SessionUpdate>,
) -> Result<SessionHandle, StartError>
where
    D: Detector + 'static,
{
    let capability = probe(&mut detector, &config.model.source_uri).await;
    if let ModelCapability::Unavailable(reason) = &capability {
        error!("Startup error: model {} unavailable: {}", detector.name(), reason);
        return Err(ModelUnavailableError(reason.clone()).into());
    }
    info!("Model {} loaded from {}", detector.name(), config.model.source_uri);

    let video = camera.open().await.map_err(|e| {
        error!("Webcam error: {:?}", e);
        StartError::from(e)
    })?;
    let source = video.dimensions();
    info!("Webcam stream started at {}x{}", source.width, source.height);

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let core = SessionCore::new(
        EmotionGate::new(config.gate.excluded_labels.clone()),
        capability,
        Collaborators {
            detector: Arc::new(detector),
            backend,
            video,
        },
        display,
        event_tx.clone(),
        update_tx,
    );
    let core_task = tokio::spawn(core.run(event_rx));

    let cancel = CancellationToken::new();
    let ticker_task = spawn_ticker(
        Duration::from_millis(config.poller.interval_ms.max(1)),
        event_tx.clone(),
        cancel.clone(),
    );

    Ok(SessionHandle {
        event_tx,
        cancel,
        core_task,
        ticker_task,
    })
}

/// Availability of the start action.
///
/// Disabled while a start attempt runs or a session is live; a failed
/// attempt re-enables it and records the message for the user.
#[derive(Debug, Clone)]
pub struct StartControl {
    enabled: bool,
    status: Option<String>,
}

impl Default for StartControl {
    fn default() -> Self {
        Self {
            enabled: true,
            status: None,
        }
    }
}

impl StartControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Claim the start action. Returns false if it is currently disabled.
    pub fn begin(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.status = None;
        true
    }

    pub fn finish<T>(&mut self, result: &Result<T, StartError>) {
        if let Err(e) = result {
            self.enabled = true;
            self.status = Some(e.user_message());
        }
    }

    /// The session ended; allow starting again.
    pub fn stopped(&mut self) {
        self.enabled = true;
    }
}
