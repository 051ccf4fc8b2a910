//! Still-image camera reached over HTTP (IP cameras, webcam bridges)

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::camera::{Camera, VideoStream};
use crate::error::CameraError;
use crate::models::Frame;

/// Camera whose every frame is a `GET` on a snapshot URL
///
/// Exclusive within the process: a second `acquire` fails with
/// [`CameraError::Busy`] until the first stream is stopped.
pub struct SnapshotCamera {
    client: reqwest::Client,
    url: String,
    in_use: Arc<AtomicBool>,
}

impl SnapshotCamera {
    pub fn new(url: impl Into<String>) -> Result<Self, CameraError> {
        Self::with_timeout(url, Duration::from_secs(10))
    }

    /// Every request, probe included, fails after `timeout`
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, CameraError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CameraError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            in_use: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Camera for SnapshotCamera {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CameraError> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            return Err(CameraError::Busy);
        }

        let stream = SnapshotStream {
            client: self.client.clone(),
            url: self.url.clone(),
            in_use: Arc::clone(&self.in_use),
            stopped: false,
        };

        // Probe once; dropping `stream` on failure frees the device
        match fetch_frame(&stream.client, &stream.url).await {
            Ok(frame) => {
                debug!(bytes = frame.data.len(), "Camera reachable");
                Ok(Box::new(stream))
            }
            Err(FetchError::Status(status)) => Err(status_error(status)),
            Err(FetchError::Transport(msg)) => Err(CameraError::Unavailable(msg)),
        }
    }
}

struct SnapshotStream {
    client: reqwest::Client,
    url: String,
    in_use: Arc<AtomicBool>,
    stopped: bool,
}

#[async_trait]
impl VideoStream for SnapshotStream {
    async fn snapshot(&self) -> Result<Frame, CameraError> {
        if self.stopped {
            return Err(CameraError::Unavailable("stream stopped".to_string()));
        }
        fetch_frame(&self.client, &self.url)
            .await
            .map_err(|e| match e {
                FetchError::Status(status) => status_error(status),
                FetchError::Transport(msg) => CameraError::Capture(msg),
            })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        self.stop();
    }
}

enum FetchError {
    Status(StatusCode),
    Transport(String),
}

async fn fetch_frame(client: &reqwest::Client, url: &str) -> Result<Frame, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let data = resp
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if data.is_empty() {
        return Err(FetchError::Transport("empty image".to_string()));
    }

    Ok(Frame {
        data: data.to_vec(),
        content_type,
        captured_at: Utc::now(),
    })
}

fn status_error(status: StatusCode) -> CameraError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CameraError::PermissionDenied(status.to_string())
        }
        _ => CameraError::Unavailable(status.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_map_to_permission_denied() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED),
            CameraError::PermissionDenied(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN),
            CameraError::PermissionDenied(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE),
            CameraError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_camera_is_released() {
        // Port 9 (discard) on loopback is not expected to serve HTTP
        let camera =
            SnapshotCamera::with_timeout("http://127.0.0.1:9/snapshot.jpg", Duration::from_secs(2))
                .unwrap();

        assert!(matches!(
            camera.acquire().await,
            Err(CameraError::Unavailable(_))
        ));
        assert!(!camera.in_use.load(Ordering::SeqCst));
    }
}
