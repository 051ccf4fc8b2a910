//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Household inventory with camera-based item recognition",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/inventory", api = domain_inventory::ApiDoc),
        (path = "/api/capture", api = domain_capture::ApiDoc)
    ),
    tags(
        (name = "Inventory", description = "Item quantities (MongoDB)"),
        (name = "Capture", description = "Camera capture and object classification")
    )
)]
pub struct ApiDoc;
