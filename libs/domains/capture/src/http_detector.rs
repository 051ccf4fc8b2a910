//! Client for a COCO-SSD style object-detection service
//!
//! - `GET  {base}/healthz` answers once the model weights are loaded
//! - `POST {base}/v1/detect` takes a multipart `image` and returns
//!   `{ "predictions": [{ "class": "bottle", "score": 0.91, "bbox": [x, y, w, h] }] }`
//!   ordered by descending score

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::detection::{DetectionModel, ModelLoader};
use crate::error::{CaptureError, CaptureResult};
use crate::models::{Detection, Frame};

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    class: String,
    score: f32,
    #[serde(default)]
    bbox: [f32; 4],
}

impl From<Prediction> for Detection {
    fn from(p: Prediction) -> Self {
        Self {
            label: p.class,
            confidence: p.score.clamp(0.0, 1.0),
            bounding_box: p.bbox.into(),
        }
    }
}

/// Loads the remote model by waiting for the service to report healthy
#[derive(Clone)]
pub struct HttpModelLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelLoader {
    pub fn new(base_url: impl Into<String>) -> CaptureResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// `timeout` bounds both the readiness probe and each inference call
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> CaptureResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptureError::ModelLoad(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn load(&self) -> CaptureResult<Arc<dyn DetectionModel>> {
        let url = format!("{}/healthz", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CaptureError::ModelLoad(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CaptureError::ModelLoad(format!(
                "detector not ready: {}",
                resp.status()
            )));
        }

        Ok(Arc::new(HttpDetectionModel {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
        }))
    }
}

/// Remote model handle produced by [`HttpModelLoader`]
pub struct HttpDetectionModel {
    client: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl DetectionModel for HttpDetectionModel {
    #[instrument(skip_all, fields(bytes = frame.data.len()))]
    async fn detect(&self, frame: &Frame) -> CaptureResult<Vec<Detection>> {
        let url = format!("{}/v1/detect", self.base_url);

        let part = Part::bytes(frame.data.clone())
            .file_name("frame.jpg")
            .mime_str(&frame.content_type)
            .map_err(|e| CaptureError::Detection(format!("invalid content type: {e}")))?;
        let form = Form::new().part("image", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::Detection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CaptureError::Detection(format!(
                "detector returned {} - {}",
                status, body
            )));
        }

        let result: DetectResponse = resp
            .json()
            .await
            .map_err(|e| CaptureError::Detection(format!("malformed response: {e}")))?;

        debug!(count = result.predictions.len(), "Detector responded");
        Ok(result.predictions.into_iter().map(Detection::from).collect())
    }
}
