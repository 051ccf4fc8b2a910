use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Store I/O failed (network, permission, quota)
    #[error("Store error: {0}")]
    Database(String),

    /// Every compare-and-set attempt lost a race against another writer
    #[error("Item '{name}' is being updated concurrently, gave up after {attempts} attempts")]
    Contention { name: String, attempts: u32 },
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Validation(msg) => AppError::BadRequest(msg),
            InventoryError::Database(msg) => AppError::InternalServerError(msg),
            err @ InventoryError::Contention { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for InventoryError {
    fn from(err: mongodb::error::Error) -> Self {
        InventoryError::Database(err.to_string())
    }
}
