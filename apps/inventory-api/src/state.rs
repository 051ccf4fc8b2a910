//! Shared application state passed to the route builders.

use std::sync::Arc;

use database::mongodb::Client;
use domain_capture::CapturePipeline;
use domain_inventory::{InventoryViewModel, MongoInventoryRepository};

pub type Inventory = InventoryViewModel<MongoInventoryRepository>;
pub type Pipeline = CapturePipeline<MongoInventoryRepository>;

/// Cloned into each router; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (shares the underlying connection pool)
    pub mongo_client: Client,
    /// The one inventory view shared by the list routes and the capture pipeline
    pub inventory: Arc<Inventory>,
    pub pipeline: Arc<Pipeline>,
}
