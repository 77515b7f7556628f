use thiserror::Error;

/// Why the camera stream could not be acquired.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraAccessError {
    #[error("Camera access denied. Please allow camera permissions.")]
    Denied,

    #[error("No camera found. Please connect a camera.")]
    NotFound,

    #[error("Camera is in use by another application. Please close other apps (Zoom, Teams, Camera, etc.) and try again.")]
    Busy,

    #[error("Could not access webcam: {0}")]
    Other(String),
}

/// The detection model is absent or its parameters failed to load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Detection model unavailable: {0}")]
pub struct ModelUnavailableError(pub String);

/// A single detection call failed. Transient; polling continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Face detection error: {0}")]
pub struct DetectionCallError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendRequestError {
    #[error("Playlist request failed: {0}")]
    Network(String),

    #[error("Playlist backend returned HTTP {0}")]
    Status(u16),

    #[error("Could not decode playlist response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendRequestError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            BackendRequestError::Status(status.as_u16())
        } else if err.is_decode() {
            BackendRequestError::Decode(err.to_string())
        } else {
            BackendRequestError::Network(err.to_string())
        }
    }
}

/// Errors that abort starting a session. The start action stays available
/// for a retry after any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error(transparent)]
    Camera(#[from] CameraAccessError),

    #[error(transparent)]
    Model(#[from] ModelUnavailableError),
}

impl StartError {
    /// Text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            StartError::Camera(e) => e.to_string(),
            StartError::Model(e) => format!("Error: {}", e),
        }
    }
}
