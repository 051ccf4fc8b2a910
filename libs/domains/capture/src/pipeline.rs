//! Capture pipeline: camera → frame → detection → inventory increment
//!
//! ```text
//! Idle → AcquiringCamera → Streaming → Capturing → Detecting → Mutating → Idle
//!            │                 │           │            │           │
//!            └─────────────────┴───────────┴────────────┴───────────┴──→ Idle (error / cancel)
//! ```
//!
//! One cycle at a time. The camera stream lives in a [`StreamGuard`], so it
//! is stopped on every exit path, including a dropped future.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use domain_inventory::{InventoryRepository, InventoryViewModel};

use crate::camera::{Camera, StreamGuard};
use crate::detection::DetectionAdapter;
use crate::error::{CaptureError, CaptureResult};
use crate::models::{CaptureOutcome, CaptureState, CaptureStatus, Frame};
use crate::resolver::NameResolver;

pub struct CapturePipeline<R: InventoryRepository> {
    camera: Arc<dyn Camera>,
    detector: DetectionAdapter,
    resolver: Box<dyn NameResolver>,
    inventory: Arc<InventoryViewModel<R>>,
    state: Mutex<CaptureState>,
    stream: tokio::sync::Mutex<Option<StreamGuard>>,
}

/// Puts the state machine back to `Idle` when a cycle ends, however it ends
struct CycleGuard<'a> {
    state: &'a Mutex<CaptureState>,
    armed: bool,
}

impl CycleGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != CaptureState::Idle {
                debug!(from = %*state, "Capture cycle ended, back to idle");
                *state = CaptureState::Idle;
            }
        }
    }
}

impl<R: InventoryRepository> CapturePipeline<R> {
    pub fn new(
        camera: Arc<dyn Camera>,
        detector: DetectionAdapter,
        resolver: impl NameResolver + 'static,
        inventory: Arc<InventoryViewModel<R>>,
    ) -> Self {
        Self {
            camera,
            detector,
            resolver: Box::new(resolver),
            inventory,
            state: Mutex::new(CaptureState::Idle),
            stream: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> CaptureState {
        *self.lock_state()
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            state: self.state(),
            model_loaded: self.detector.is_loaded(),
        }
    }

    pub fn detector(&self) -> &DetectionAdapter {
        &self.detector
    }

    /// Open the camera and start streaming
    ///
    /// Rejected with [`CaptureError::Busy`] unless idle. A camera failure
    /// returns the pipeline to idle; nothing is retried.
    #[instrument(skip(self))]
    pub async fn start_capture(&self) -> CaptureResult<CaptureState> {
        self.transition(CaptureState::Idle, CaptureState::AcquiringCamera)
            .map_err(CaptureError::Busy)?;
        let cycle = self.cycle_guard();

        let stream = self.camera.acquire().await.inspect_err(|e| {
            warn!(error = %e, "Camera acquisition failed");
        })?;
        let guard = StreamGuard::new(stream);

        *self.stream.lock().await = Some(guard);
        self.set_state(CaptureState::Streaming);
        cycle.disarm();

        info!("Camera streaming");
        Ok(CaptureState::Streaming)
    }

    /// Latest frame of the live stream, for display
    pub async fn preview(&self) -> CaptureResult<Frame> {
        let slot = self.stream.lock().await;
        match (&*slot, self.state()) {
            (Some(stream), CaptureState::Streaming) => Ok(stream.snapshot().await?),
            (_, state) => Err(CaptureError::NotStreaming(state)),
        }
    }

    /// Capture-and-classify: snapshot the stream, detect, add the top
    /// detection to the inventory, then release the camera
    ///
    /// Only the highest-ranked detection is considered. An empty result or
    /// an unusable label ends the cycle with
    /// [`CaptureOutcome::NothingDetected`] and no store mutation.
    #[instrument(skip(self))]
    pub async fn capture_frame(&self) -> CaptureResult<CaptureOutcome> {
        self.transition(CaptureState::Streaming, CaptureState::Capturing)
            .map_err(CaptureError::NotStreaming)?;
        let _cycle = self.cycle_guard();

        let Some(stream) = self.stream.lock().await.take() else {
            return Err(CaptureError::NotStreaming(CaptureState::Capturing));
        };

        let frame = stream.snapshot().await?;
        debug!(bytes = frame.data.len(), "Frame captured");

        self.set_state(CaptureState::Detecting);
        let top = self.detector.top(&frame).await?;

        let Some(detection) = top else {
            info!("Nothing detected");
            return Ok(CaptureOutcome::NothingDetected);
        };

        let Some(name) = self.resolver.resolve(&detection.label) else {
            info!(label = %detection.label, "Detected label does not map to an item");
            return Ok(CaptureOutcome::NothingDetected);
        };

        self.set_state(CaptureState::Mutating);
        let quantity = self.inventory.service().increment(&name).await?;
        self.inventory.refresh().await?;

        stream.release();
        info!(
            %name,
            quantity,
            confidence = detection.confidence,
            "Captured item added to inventory"
        );
        Ok(CaptureOutcome::Added {
            name,
            quantity,
            detection,
        })
    }

    /// Stop streaming without capturing
    ///
    /// A no-op when idle. Rejected while a capture is being processed, since
    /// inference cannot be interrupted.
    #[instrument(skip(self))]
    pub async fn cancel(&self) -> CaptureResult<CaptureState> {
        let mut slot = self.stream.lock().await;
        let mut state = self.lock_state();

        match *state {
            CaptureState::Idle => Ok(CaptureState::Idle),
            CaptureState::Streaming => {
                if let Some(stream) = slot.take() {
                    stream.release();
                }
                *state = CaptureState::Idle;
                info!("Capture cancelled");
                Ok(CaptureState::Idle)
            }
            other => Err(CaptureError::Busy(other)),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `from` → `to`, or report the current state if it isn't `from`
    fn transition(&self, from: CaptureState, to: CaptureState) -> Result<(), CaptureState> {
        let mut state = self.lock_state();
        if *state != from {
            return Err(*state);
        }
        debug!(%from, %to, "Capture state");
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: CaptureState) {
        let mut state = self.lock_state();
        debug!(from = %*state, %to, "Capture state");
        *state = to;
    }

    fn cycle_guard(&self) -> CycleGuard<'_> {
        CycleGuard {
            state: &self.state,
            armed: true,
        }
    }
}
