//! # Axum Helpers
//!
//! Shared building blocks for the HTTP surface.
//!
//! - **[`server`]**: router assembly with OpenAPI docs, health endpoints, graceful shutdown
//! - **[`errors`]**: `AppError` and the JSON `ErrorResponse` body
//! - **[`extractors`]**: `ValidatedJson`
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let router = create_router::<ApiDoc>(api_routes, &ServerConfig::default())?;
//! let app = router.merge(health_router(app_info!()));
//! create_production_app(app, &ServerConfig::default(), Duration::from_secs(30), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod server;

pub use errors::{AppError, ErrorResponse};
pub use extractors::ValidatedJson;
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
