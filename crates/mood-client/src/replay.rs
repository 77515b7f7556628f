//! Stand-in collaborators: a detector that replays a recorded script and a
//! camera that produces blank frames.
//!
//! The script is a JSON array with one entry per detection call; `null`
//! means no face was found:
//!
//! ```json
//! [
//!   {"box": {"x": 200, "y": 120, "width": 180, "height": 180},
//!    "expressions": {"happy": 0.82, "neutral": 0.15, "sad": 0.03}},
//!   null
//! ]
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::camera::{CameraAccess, VideoSource};
use crate::detection::{Detector, FaceDetection, VideoFrame};
use crate::error::{CameraAccessError, DetectionCallError, ModelUnavailableError};
use crate::geometry::Dimensions;

/// Sample script seeded into the data dir on first run.
pub const SAMPLE_SCRIPT: &str = include_str!("../detections.sample.json");

#[derive(Default)]
pub struct ReplayDetector {
    script: Vec<Option<FaceDetection>>,
    cursor: AtomicUsize,
    latency: Duration,
}

impl ReplayDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with an already loaded script.
    pub fn from_script(script: Vec<Option<FaceDetection>>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Delay every detection call, to mimic inference time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

pub fn parse_script(content: &str) -> anyhow::Result<Vec<Option<FaceDetection>>> {
    Ok(serde_json::from_str(content)?)
}

#[async_trait]
impl Detector for ReplayDetector {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn load_parameters(&mut self, source_uri: &str) -> Result<(), ModelUnavailableError> {
        let content = tokio::fs::read_to_string(source_uri)
            .await
            .map_err(|e| ModelUnavailableError(format!("{}: {}", source_uri, e)))?;
        let script = parse_script(&content)
            .map_err(|e| ModelUnavailableError(format!("{}: {}", source_uri, e)))?;
        if script.is_empty() {
            return Err(ModelUnavailableError(format!(
                "{}: detection script is empty",
                source_uri
            )));
        }
        info!("Replay detector loaded {} entries from {}", script.len(), source_uri);
        self.script = script;
        self.cursor.store(0, Ordering::Relaxed);
        Ok(())
    }

    async fn detect_one(
        &self,
        _frame: &VideoFrame,
    ) -> Result<Option<FaceDetection>, DetectionCallError> {
        if self.script.is_empty() {
            return Err(DetectionCallError("no parameters loaded".into()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.script.len();
        Ok(self.script[idx].clone())
    }
}

/// Camera producing blank RGB frames at a fixed resolution.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    dimensions: Dimensions,
    warmup: Duration,
    failure: Option<CameraAccessError>,
}

impl SyntheticCamera {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            warmup: Duration::ZERO,
            failure: None,
        }
    }

    /// Frames only become decodable after `warmup` has elapsed.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Make `open` fail with `err`.
    pub fn failing(mut self, err: CameraAccessError) -> Self {
        self.failure = Some(err);
        self
    }
}

#[async_trait]
impl CameraAccess for SyntheticCamera {
    async fn open(&self) -> Result<Box<dyn VideoSource>, CameraAccessError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.dimensions.is_empty() {
            return Err(CameraAccessError::NotFound);
        }
        debug!(
            "Synthetic camera opened at {}x{}",
            self.dimensions.width, self.dimensions.height
        );
        Ok(Box::new(SyntheticSource {
            dimensions: self.dimensions,
            opened_at: Instant::now(),
            warmup: self.warmup,
            released: false,
        }))
    }
}

struct SyntheticSource {
    dimensions: Dimensions,
    opened_at: Instant,
    warmup: Duration,
    released: bool,
}

impl VideoSource for SyntheticSource {
    fn is_ready(&self) -> bool {
        !self.released && self.opened_at.elapsed() >= self.warmup
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn capture(&mut self) -> Option<VideoFrame> {
        if !self.is_ready() {
            return None;
        }
        let len = self.dimensions.width as usize * self.dimensions.height as usize * 3;
        Some(VideoFrame {
            dimensions: self.dimensions,
            pixels: vec![0; len],
        })
    }

    fn release(&mut self) {
        if !self.released {
            debug!("Synthetic camera released");
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame() -> VideoFrame {
        VideoFrame {
            dimensions: Dimensions::new(4, 4),
            pixels: vec![0; 48],
        }
    }

    #[test]
    fn test_sample_script_parses() {
        let script = parse_script(SAMPLE_SCRIPT).unwrap();
        assert!(!script.is_empty());
        assert!(script.iter().any(|e| e.is_none()));
        assert!(script.iter().any(|e| e.is_some()));
    }

    #[tokio::test]
    async fn test_load_and_replay_cycles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"box":{{"x":0,"y":0,"width":10,"height":10}},"expressions":{{"sad":0.9}}}}, null]"#
        )
        .unwrap();

        let mut detector = ReplayDetector::new();
        detector
            .load_parameters(file.path().to_str().unwrap())
            .await
            .unwrap();

        let first = detector.detect_one(&frame()).await.unwrap();
        assert_eq!(first.unwrap().dominant_emotion().unwrap().0, "sad");
        assert!(detector.detect_one(&frame()).await.unwrap().is_none());
        assert!(detector.detect_one(&frame()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_script_is_model_unavailable() {
        let mut detector = ReplayDetector::new();
        let err = detector
            .load_parameters("/nonexistent/moodplay/detections.json")
            .await
            .unwrap_err();
        assert!(err.0.contains("/nonexistent/moodplay/detections.json"));
    }

    #[tokio::test]
    async fn test_detect_before_load_fails() {
        let detector = ReplayDetector::new();
        assert!(detector.detect_one(&frame()).await.is_err());
    }

    #[tokio::test]
    async fn test_synthetic_camera_lifecycle() {
        let camera = SyntheticCamera::new(Dimensions::new(8, 6));
        let mut source = camera.open().await.unwrap();
        assert!(source.is_ready());
        assert_eq!(source.capture().unwrap().pixels.len(), 8 * 6 * 3);

        source.release();
        assert!(!source.is_ready());
        assert!(source.capture().is_none());
    }

    #[tokio::test]
    async fn test_synthetic_camera_failures() {
        let denied = SyntheticCamera::new(Dimensions::new(8, 6)).failing(CameraAccessError::Denied);
        assert_eq!(denied.open().await.err(), Some(CameraAccessError::Denied));

        let empty = SyntheticCamera::new(Dimensions::new(0, 0));
        assert_eq!(empty.open().await.err(), Some(CameraAccessError::NotFound));
    }

    #[tokio::test]
    async fn test_warmup_delays_readiness() {
        let camera = SyntheticCamera::new(Dimensions::new(8, 6)).with_warmup(Duration::from_secs(60));
        let mut source = camera.open().await.unwrap();
        assert!(!source.is_ready());
        assert!(source.capture().is_none());
    }
}
