//! Capture Domain
//!
//! Point a camera at an object, classify it, count it.
//!
//! ```text
//! Camera ──frame──▶ DetectionAdapter ──label──▶ NameResolver ──name──▶ InventoryService::increment
//!                                                                          │
//!                                                                          ▼
//!                                                               InventoryViewModel::refresh
//! ```
//!
//! - [`camera`]: device boundary and the [`StreamGuard`] that always releases it
//! - [`detection`]: model boundary and the caching [`DetectionAdapter`]
//! - [`resolver`]: label → item name
//! - [`pipeline`]: the single-flight capture state machine
//! - [`http_camera`], [`http_detector`]: HTTP-backed camera and detector

pub mod camera;
pub mod detection;
pub mod error;
pub mod handlers;
pub mod http_camera;
pub mod http_detector;
pub mod models;
pub mod pipeline;
pub mod resolver;

pub use camera::{Camera, StreamGuard, VideoStream};
pub use detection::{DetectionAdapter, DetectionModel, ModelLoader};
pub use error::{CameraError, CaptureError, CaptureResult};
pub use handlers::ApiDoc;
pub use http_camera::SnapshotCamera;
pub use http_detector::{HttpDetectionModel, HttpModelLoader};
pub use models::{BoundingBox, CaptureOutcome, CaptureState, CaptureStatus, Detection, Frame};
pub use pipeline::CapturePipeline;
pub use resolver::{LabelResolver, NameResolver};
