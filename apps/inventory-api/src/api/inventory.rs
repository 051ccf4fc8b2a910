//! Inventory list routes

use axum::Router;
use domain_inventory::handlers;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    handlers::router(state.inventory.clone())
}
