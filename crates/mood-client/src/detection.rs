//! Detection model boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DetectionCallError, ModelUnavailableError};
use crate::geometry::{BoundingBox, Dimensions};

/// One captured video frame handed to the detector.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub dimensions: Dimensions,
    /// Packed RGB8 pixels, row-major.
    pub pixels: Vec<u8>,
}

/// A single face with per-label emotion confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub expressions: BTreeMap<String, f32>,
}

impl FaceDetection {
    /// Highest-confidence label.
    ///
    /// Equal scores resolve to the label that sorts first, so the choice is
    /// stable across runs. NaN scores are ignored.
    pub fn dominant_emotion(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for (label, &score) in &self.expressions {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label.as_str(), score)),
            }
        }
        best
    }
}

/// Outcome of the one-time model probe at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCapability {
    Ready,
    Unavailable(String),
}

impl ModelCapability {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelCapability::Ready)
    }
}

/// Face/emotion detection backend.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Load model parameters from `source_uri`. Must succeed before `detect_one`.
    async fn load_parameters(&mut self, source_uri: &str) -> Result<(), ModelUnavailableError>;

    /// Detect at most one face in `frame`. `Ok(None)` means no face in view.
    async fn detect_one(
        &self,
        frame: &VideoFrame,
    ) -> Result<Option<FaceDetection>, DetectionCallError>;
}

/// Load parameters and report the resulting capability.
pub async fn probe<D: Detector + ?Sized>(detector: &mut D, source_uri: &str) -> ModelCapability {
    match detector.load_parameters(source_uri).await {
        Ok(()) => ModelCapability::Ready,
        Err(e) => ModelCapability::Unavailable(e.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(scores: &[(&str, f32)]) -> FaceDetection {
        FaceDetection {
            bbox: BoundingBox::default(),
            expressions: scores.iter().map(|(l, s)| (l.to_string(), *s)).collect(),
        }
    }

    #[test]
    fn test_dominant_picks_highest() {
        let f = face(&[("happy", 0.7), ("sad", 0.1), ("neutral", 0.2)]);
        assert_eq!(f.dominant_emotion(), Some(("happy", 0.7)));
    }

    #[test]
    fn test_dominant_tie_breaks_by_label_order() {
        let f = face(&[("sad", 0.5), ("angry", 0.5), ("happy", 0.0)]);
        assert_eq!(f.dominant_emotion(), Some(("angry", 0.5)));
    }

    #[test]
    fn test_dominant_ignores_nan_and_empty() {
        let f = face(&[("happy", f32::NAN), ("sad", 0.3)]);
        assert_eq!(f.dominant_emotion(), Some(("sad", 0.3)));
        assert_eq!(face(&[]).dominant_emotion(), None);
    }

    #[test]
    fn test_face_detection_json_shape() {
        let json = r#"{"box":{"x":1.0,"y":2.0,"width":3.0,"height":4.0},"expressions":{"happy":0.9}}"#;
        let f: FaceDetection = serde_json::from_str(json).unwrap();
        assert_eq!(f.bbox.width, 3.0);
        assert_eq!(f.dominant_emotion(), Some(("happy", 0.9)));
    }
}
