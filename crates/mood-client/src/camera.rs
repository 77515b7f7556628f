//! Camera boundary: acquiring a stream and pulling frames from it.

use async_trait::async_trait;

use crate::detection::VideoFrame;
use crate::error::CameraAccessError;
use crate::geometry::Dimensions;

/// An open video stream. Owned exclusively by the session loop.
pub trait VideoSource: Send {
    /// True once the stream produces decodable frames.
    fn is_ready(&self) -> bool;

    /// Capture resolution of the stream.
    fn dimensions(&self) -> Dimensions;

    /// Grab the current frame, if one is available.
    fn capture(&mut self) -> Option<VideoFrame>;

    /// Stop the stream and release the device. Idempotent.
    fn release(&mut self);
}

#[async_trait]
pub trait CameraAccess: Send + Sync {
    async fn open(&self) -> Result<Box<dyn VideoSource>, CameraAccessError>;
}
