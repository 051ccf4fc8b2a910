//! Database connectors and connection utilities.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connection management and health checks
//! - `config` - `core_config::FromEnv` support for the connection settings
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "inventory");
//! let client = connect_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{RetryConfig, retry_with_backoff};
