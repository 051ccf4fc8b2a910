//! Detection adapter: a lazily loaded, cached object-detection model

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::error::CaptureResult;
use crate::models::{Detection, Frame};

/// A loaded model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionModel: Send + Sync {
    /// Objects found in `frame`, best first
    async fn detect(&self, frame: &Frame) -> CaptureResult<Vec<Detection>>;
}

/// Produces a [`DetectionModel`]; may be slow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> CaptureResult<Arc<dyn DetectionModel>>;
}

/// Loads the model on first use and keeps it for the life of the process
///
/// A failed load is not cached: the next call tries again. Detections keep
/// the model's order; with a confidence floor set, detections below it are
/// skipped.
pub struct DetectionAdapter {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn DetectionModel>>,
    min_confidence: f32,
}

impl DetectionAdapter {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
            min_confidence: 0.0,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// The cached model, loading it if needed
    pub async fn model(&self) -> CaptureResult<Arc<dyn DetectionModel>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                info!("Loading detection model");
                let model = self.loader.load().await.inspect_err(|e| {
                    warn!(error = %e, "Detection model failed to load");
                })?;
                info!("Detection model ready");
                Ok::<_, crate::error::CaptureError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// Run the model on `frame`; the result iterates best first
    #[instrument(skip_all, fields(bytes = frame.data.len()))]
    pub async fn detect(&self, frame: &Frame) -> CaptureResult<impl Iterator<Item = Detection>> {
        let model = self.model().await?;
        let detections = model.detect(frame).await?;
        debug!(count = detections.len(), "Model returned detections");

        let floor = self.min_confidence;
        Ok(detections
            .into_iter()
            .filter(move |detection| detection.confidence >= floor))
    }

    /// The model's first detection, if it clears the confidence floor
    ///
    /// Later detections are never considered, even when the first one is
    /// rejected by the floor.
    #[instrument(skip_all, fields(bytes = frame.data.len()))]
    pub async fn top(&self, frame: &Frame) -> CaptureResult<Option<Detection>> {
        let model = self.model().await?;
        let first = model.detect(frame).await?.into_iter().next();

        Ok(first.filter(|detection| {
            let passes = detection.confidence >= self.min_confidence;
            if !passes {
                debug!(
                    label = %detection.label,
                    confidence = detection.confidence,
                    floor = self.min_confidence,
                    "Top detection below confidence floor"
                );
            }
            passes
        }))
    }
}
