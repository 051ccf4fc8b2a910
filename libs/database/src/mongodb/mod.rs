//! MongoDB connection management

mod config;
mod connector;
mod health;

pub use config::MongoConfig;
pub use connector::{MongoError, connect, connect_with_retry};
pub use health::{HealthStatus, check_health, check_health_detailed};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
