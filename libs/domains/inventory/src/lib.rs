//! Inventory Domain
//!
//! Item counts kept in a keyed document store, plus the in-memory list the
//! UI renders.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← HTTP endpoints
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  View Model  │  ← Materialised list, search query, refresh after mutation
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Service    │  ← increment / decrement semantics, conflict retries
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Repository  │  ← Document store (trait + MongoDB / in-memory)
//! └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_inventory::{
//!     handlers, InventoryService, InventoryViewModel, MongoInventoryRepository,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let repository = MongoInventoryRepository::new(client.database("pantry"));
//!
//! let view_model = Arc::new(InventoryViewModel::new(InventoryService::new(repository)));
//! view_model.refresh().await?;
//!
//! let router = handlers::router(view_model);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod view_model;

pub use error::{InventoryError, InventoryResult};
pub use handlers::ApiDoc;
pub use models::{
    AddItem, Decrement, InventoryItem, InventoryView, SearchQuery, StoreOptions, UpdateStrategy,
};
pub use mongodb::MongoInventoryRepository;
pub use repository::{InMemoryInventoryRepository, InventoryRepository};
pub use service::InventoryService;
pub use view_model::InventoryViewModel;
