//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "error": "InternalServerError",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "error": "BadRequest",
        "message": "Request validation failed",
        "details": {
            "name": [{
                "code": "length",
                "message": null,
                "params": {"min": 1, "max": 200, "value": ""}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Forbidden",
    content_type = "application/json",
    example = json!({
        "error": "Forbidden",
        "message": "Camera access denied: 401 Unauthorized"
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict",
    content_type = "application/json",
    example = json!({
        "error": "Conflict",
        "message": "A capture cycle is already in progress (state: streaming)"
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Gateway - an upstream service failed",
    content_type = "application/json",
    example = json!({
        "error": "BadGateway",
        "message": "Detection failed: inference service returned 500"
    })
)]
pub struct BadGatewayResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Service Unavailable",
    content_type = "application/json",
    example = json!({
        "error": "ServiceUnavailable",
        "message": "Detection model failed to load"
    })
)]
pub struct ServiceUnavailableResponse(pub ErrorResponse);
