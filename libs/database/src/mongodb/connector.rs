use mongodb::{Client, bson::doc, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Error type for MongoDB connection setup
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Connect using a [`MongoConfig`] and verify the server answers a ping.
pub async fn connect(config: &MongoConfig) -> Result<Client, MongoError> {
    info!(url = %config.redacted_url(), "Connecting to MongoDB");

    let mut options = ClientOptions::parse(&config.url).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

    info!("Successfully connected to MongoDB");
    Ok(client)
}

/// [`connect`] with exponential backoff, for startup against a store that
/// may still be coming up. `None` uses the default [`RetryConfig`].
pub async fn connect_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> Result<Client, MongoError> {
    retry_with_backoff(
        "mongodb connect",
        || connect(config),
        retry_config.unwrap_or_default(),
    )
    .await
}
