use std::sync::Arc;
use std::time::Duration;

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_capture::{
    CapturePipeline, DetectionAdapter, HttpModelLoader, LabelResolver, SnapshotCamera,
};
use domain_inventory::{InventoryService, InventoryViewModel, MongoInventoryRepository};
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    let mongo_client = database::mongodb::connect_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    let repository = MongoInventoryRepository::new(db);
    let service = InventoryService::with_options(repository, config.store);
    info!(
        strategy = %config.store.strategy,
        max_attempts = config.store.max_attempts,
        "Inventory store ready"
    );

    let inventory = Arc::new(InventoryViewModel::new(service));
    match inventory.refresh().await {
        Ok(view) => info!(items = view.total, "Loaded initial inventory"),
        Err(e) => warn!("Initial inventory load failed, starting empty: {}", e),
    }

    let capture = &config.capture;
    let camera = SnapshotCamera::with_timeout(&capture.snapshot_url, capture.camera_timeout)?;
    let loader = HttpModelLoader::with_timeout(&capture.detector_url, capture.detector_timeout)?;
    let detector = DetectionAdapter::new(loader).with_min_confidence(capture.min_confidence);
    let resolver = LabelResolver::new().with_max_length(capture.label_max_length);

    let pipeline = Arc::new(CapturePipeline::new(
        Arc::new(camera),
        detector,
        resolver,
        inventory.clone(),
    ));

    if capture.preload {
        // A failed preload is retried by the first capture
        match pipeline.detector().model().await {
            Ok(_) => info!("Detection model preloaded"),
            Err(e) => warn!("Detection model preload failed: {}", e),
        }
    }

    let state = AppState {
        config,
        mongo_client,
        inventory,
        pipeline,
    };

    let api_routes = api::routes(&state);

    let router =
        axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &state.config.server)?;
    let app = router.merge(health_router(state.config.app));

    info!("Starting Inventory API with production-ready shutdown (30s timeout)");

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, Duration::from_secs(30), async move {
        info!("Shutting down: releasing the camera");
        if let Err(e) = state.pipeline.cancel().await {
            // An in-flight cycle releases the camera when its request is dropped
            warn!("Capture cycle still running at shutdown: {}", e);
        }
        drop(state.mongo_client);
        info!("MongoDB connection closed successfully");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Inventory API shutdown complete");
    Ok(())
}
