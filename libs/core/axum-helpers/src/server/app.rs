use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the CORS layer from the configured allow-list.
///
/// With no origins configured every origin is allowed, which suits a single
/// operator running the service next to its front end.
fn cors_layer(server_config: &ServerConfig) -> io::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let origins = server_config.allowed_origins();
    if origins.is_empty() {
        info!("CORS_ALLOWED_ORIGIN not set, allowing any origin");
        return Ok(layer.allow_origin(Any));
    }

    let allowed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    info!(origins = ?origins, "CORS configured");
    Ok(layer.allow_origin(AllowOrigin::list(allowed)))
}

/// Combine API routes with the cross-cutting layers.
///
/// - Swagger UI at `/swagger-ui`, OpenAPI document at `/api-docs/openapi.json`
/// - API routes nested under `/api`
/// - request tracing, CORS, compression
/// - JSON 404 fallback
///
/// Domain routers apply their own state before being passed in.
pub fn create_router<T>(apis: Router, server_config: &ServerConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(server_config)?)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serve `router` until SIGINT/SIGTERM, then run `cleanup` within
/// `shutdown_timeout`.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let mut shutdown_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        // The sender lives as long as the coordinator, so this only fires on shutdown
        let _ = shutdown_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => tracing::warn!(
                "Cleanup exceeded timeout of {:?}, forcing shutdown",
                shutdown_timeout
            ),
        }
    });

    let signal_coordinator = coordinator.clone();
    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { signal_coordinator.wait_for_signal().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // Also covers the serve-error path, where no signal was received
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
