use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

/// One still image grabbed from the camera
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub content_type: String,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            content_type: "image/jpeg".to_string(),
            captured_at: Utc::now(),
        }
    }
}

/// Pixel rectangle: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One object found in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Detection {
    pub label: String,
    /// In `[0, 1]`
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Capture pipeline states. `Idle` is both the start and the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    AcquiringCamera,
    Streaming,
    Capturing,
    Detecting,
    Mutating,
}

/// How a capture-and-classify cycle ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// The top detection was added to the inventory
    Added {
        name: String,
        /// Quantity after the increment
        quantity: i64,
        detection: Detection,
    },
    /// No usable detection; the inventory was not touched
    NothingDetected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaptureStatus {
    pub state: CaptureState,
    /// Whether the detection model has been loaded yet
    pub model_loaded: bool,
}
