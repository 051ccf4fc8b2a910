//! API routes module
//!
//! This module defines all HTTP API routes of the inventory service.

pub mod capture;
pub mod health;
pub mod inventory;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/inventory", inventory::router(state))
        .nest("/capture", capture::router(state))
        .merge(health::router(state.clone()))
}
