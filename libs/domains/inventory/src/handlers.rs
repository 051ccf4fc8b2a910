use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::InventoryResult;
use crate::models::{AddItem, InventoryItem, InventoryView, SearchQuery};
use crate::repository::InventoryRepository;
use crate::view_model::InventoryViewModel;

/// OpenAPI documentation for the inventory API
#[derive(OpenApi)]
#[openapi(
    paths(list_inventory, add_item, remove_item, search_inventory, refresh_inventory),
    components(
        schemas(InventoryItem, InventoryView, AddItem, SearchQuery),
        responses(
            BadRequestValidationResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Inventory", description = "Item counts, manual add/remove and search")
    )
)]
pub struct ApiDoc;

/// Inventory routes. The view model is shared with whatever else mutates
/// the store (the capture pipeline refreshes the same list).
pub fn router<R: InventoryRepository + 'static>(view_model: Arc<InventoryViewModel<R>>) -> Router {
    Router::new()
        .route("/", get(list_inventory).post(add_item))
        .route("/search", put(search_inventory))
        .route("/refresh", post(refresh_inventory))
        .route("/items/{name}", delete(remove_item))
        .with_state(view_model)
}

/// Current list, filtered by the active search query
#[utoipa::path(
    get,
    path = "",
    tag = "Inventory",
    responses(
        (status = 200, description = "Filtered inventory view", body = InventoryView)
    )
)]
async fn list_inventory<R: InventoryRepository>(
    State(view_model): State<Arc<InventoryViewModel<R>>>,
) -> Json<InventoryView> {
    Json(view_model.view())
}

/// Add one unit of an item by name, creating it if needed
#[utoipa::path(
    post,
    path = "",
    tag = "Inventory",
    request_body = AddItem,
    responses(
        (status = 201, description = "Item added, refreshed view returned", body = InventoryView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_item<R: InventoryRepository>(
    State(view_model): State<Arc<InventoryViewModel<R>>>,
    ValidatedJson(input): ValidatedJson<AddItem>,
) -> InventoryResult<impl IntoResponse> {
    let view = view_model.add(&input.name).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Remove one unit of an item; the last unit deletes it
#[utoipa::path(
    delete,
    path = "/items/{name}",
    tag = "Inventory",
    params(
        ("name" = String, Path, description = "Item name")
    ),
    responses(
        (status = 200, description = "Item removed (or was absent), refreshed view returned", body = InventoryView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn remove_item<R: InventoryRepository>(
    State(view_model): State<Arc<InventoryViewModel<R>>>,
    Path(name): Path<String>,
) -> InventoryResult<Json<InventoryView>> {
    let view = view_model.remove(&name).await?;
    Ok(Json(view))
}

/// Set the search query
#[utoipa::path(
    put,
    path = "/search",
    tag = "Inventory",
    request_body = SearchQuery,
    responses(
        (status = 200, description = "View filtered by the new query", body = InventoryView),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn search_inventory<R: InventoryRepository>(
    State(view_model): State<Arc<InventoryViewModel<R>>>,
    ValidatedJson(input): ValidatedJson<SearchQuery>,
) -> Json<InventoryView> {
    Json(view_model.set_query(input.query))
}

/// Re-read the whole store
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Inventory",
    responses(
        (status = 200, description = "Fresh view", body = InventoryView),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn refresh_inventory<R: InventoryRepository>(
    State(view_model): State<Arc<InventoryViewModel<R>>>,
) -> InventoryResult<Json<InventoryView>> {
    let view = view_model.refresh().await?;
    Ok(Json(view))
}
