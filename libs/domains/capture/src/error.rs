use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_inventory::InventoryError;
use thiserror::Error;

use crate::models::CaptureState;

/// Video input device failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    /// Another capture holds the device
    #[error("Camera is already in use")]
    Busy,

    #[error("Failed to grab a frame: {0}")]
    Capture(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// A capture cycle is already running
    #[error("A capture cycle is already in progress (state: {0})")]
    Busy(CaptureState),

    #[error("No live camera stream (state: {0})")]
    NotStreaming(CaptureState),

    #[error(transparent)]
    Camera(#[from] CameraError),

    /// The detection model could not be initialised
    #[error("Detection model failed to load: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            err @ (CaptureError::Busy(_) | CaptureError::NotStreaming(_)) => {
                AppError::Conflict(err.to_string())
            }
            CaptureError::Camera(camera) => match camera {
                CameraError::PermissionDenied(_) => AppError::Forbidden(camera.to_string()),
                CameraError::Unavailable(_) | CameraError::Busy => {
                    AppError::ServiceUnavailable(camera.to_string())
                }
                CameraError::Capture(_) => AppError::BadGateway(camera.to_string()),
            },
            err @ CaptureError::ModelLoad(_) => AppError::ServiceUnavailable(err.to_string()),
            err @ CaptureError::Detection(_) => AppError::BadGateway(err.to_string()),
            CaptureError::Inventory(err) => err.into(),
        }
    }
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
