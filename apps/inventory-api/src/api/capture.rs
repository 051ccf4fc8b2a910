//! Camera capture routes

use axum::Router;
use domain_capture::handlers;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    handlers::router(state.pipeline.clone())
}
