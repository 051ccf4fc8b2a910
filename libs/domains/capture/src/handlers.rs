use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::errors::responses::{
    BadGatewayResponse, ConflictResponse, ForbiddenResponse, InternalServerErrorResponse,
    ServiceUnavailableResponse,
};
use domain_inventory::InventoryRepository;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CaptureResult;
use crate::models::{BoundingBox, CaptureOutcome, CaptureState, CaptureStatus, Detection};
use crate::pipeline::CapturePipeline;

/// OpenAPI documentation for the capture API
#[derive(OpenApi)]
#[openapi(
    paths(capture_status, start_capture, preview, capture_frame, cancel_capture),
    components(
        schemas(CaptureStatus, CaptureState, CaptureOutcome, Detection, BoundingBox),
        responses(
            ConflictResponse,
            ForbiddenResponse,
            BadGatewayResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Capture", description = "Camera capture and object classification")
    )
)]
pub struct ApiDoc;

pub fn router<R: InventoryRepository + 'static>(pipeline: Arc<CapturePipeline<R>>) -> Router {
    Router::new()
        .route("/", get(capture_status).post(capture_frame))
        .route("/start", post(start_capture))
        .route("/preview", get(preview))
        .route("/cancel", post(cancel_capture))
        .with_state(pipeline)
}

/// Pipeline state and whether the detection model is loaded
#[utoipa::path(
    get,
    path = "",
    tag = "Capture",
    responses(
        (status = 200, description = "Current capture status", body = CaptureStatus)
    )
)]
async fn capture_status<R: InventoryRepository>(
    State(pipeline): State<Arc<CapturePipeline<R>>>,
) -> Json<CaptureStatus> {
    Json(pipeline.status())
}

/// Open the camera
#[utoipa::path(
    post,
    path = "/start",
    tag = "Capture",
    responses(
        (status = 200, description = "Camera streaming", body = CaptureStatus),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn start_capture<R: InventoryRepository>(
    State(pipeline): State<Arc<CapturePipeline<R>>>,
) -> CaptureResult<Json<CaptureStatus>> {
    pipeline.start_capture().await?;
    Ok(Json(pipeline.status()))
}

/// Latest frame of the live stream
#[utoipa::path(
    get,
    path = "/preview",
    tag = "Capture",
    responses(
        (status = 200, description = "Still image from the camera"),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn preview<R: InventoryRepository>(
    State(pipeline): State<Arc<CapturePipeline<R>>>,
) -> CaptureResult<impl IntoResponse> {
    let frame = pipeline.preview().await?;
    Ok(([(header::CONTENT_TYPE, frame.content_type)], frame.data))
}

/// Capture the current frame, classify it and add the top detection
#[utoipa::path(
    post,
    path = "",
    tag = "Capture",
    responses(
        (status = 200, description = "Cycle finished; camera released", body = CaptureOutcome),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn capture_frame<R: InventoryRepository>(
    State(pipeline): State<Arc<CapturePipeline<R>>>,
) -> CaptureResult<Json<CaptureOutcome>> {
    let outcome = pipeline.capture_frame().await?;
    Ok(Json(outcome))
}

/// Release the camera without capturing
#[utoipa::path(
    post,
    path = "/cancel",
    tag = "Capture",
    responses(
        (status = 200, description = "Camera released", body = CaptureStatus),
        (status = 409, response = ConflictResponse)
    )
)]
async fn cancel_capture<R: InventoryRepository>(
    State(pipeline): State<Arc<CapturePipeline<R>>>,
) -> CaptureResult<Json<CaptureStatus>> {
    pipeline.cancel().await?;
    Ok(Json(pipeline.status()))
}
