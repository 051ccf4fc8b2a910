//! Camera boundary: exclusive access to a video input device

use async_trait::async_trait;
use tracing::debug;

use crate::error::CameraError;
use crate::models::Frame;

/// A video input device that can be opened by one holder at a time
#[async_trait]
pub trait Camera: Send + Sync {
    /// Request exclusive access. The returned stream must be stopped to give
    /// the device back; wrap it in a [`StreamGuard`] so that always happens.
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// A live stream obtained from [`Camera::acquire`]
#[async_trait]
pub trait VideoStream: Send + Sync {
    /// The current frame as a still image
    async fn snapshot(&self) -> Result<Frame, CameraError>;

    /// Release every underlying track. Synchronous so it can run from `Drop`.
    fn stop(&mut self);
}

/// Owns an acquired stream and stops it exactly once, when dropped
pub struct StreamGuard {
    stream: Option<Box<dyn VideoStream>>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub async fn snapshot(&self) -> Result<Frame, CameraError> {
        match &self.stream {
            Some(stream) => stream.snapshot().await,
            None => Err(CameraError::Unavailable("stream already released".to_string())),
        }
    }

    /// Stop the stream now instead of at end of scope
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream released");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamGuard")
            .field("active", &self.stream.is_some())
            .finish()
    }
}
