//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed `validator::Validate`.
///
/// Rejections render through [`AppError`], so malformed JSON and failed
/// validation both come back as a JSON `ErrorResponse` with status 4xx.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct AddItem {
///     #[validate(length(min = 1, max = 200))]
///     name: String,
/// }
///
/// async fn add(ValidatedJson(payload): ValidatedJson<AddItem>) -> String {
///     payload.name
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
