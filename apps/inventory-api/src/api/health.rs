//! Readiness endpoint

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

/// Create a readiness router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - verifies the MongoDB connection
async fn readiness_check(State(state): State<AppState>) -> Response {
    let client = state.mongo_client.clone();
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "mongodb",
        Box::pin(async move {
            if database::mongodb::check_health(&client).await {
                Ok(())
            } else {
                Err("ping failed".to_string())
            }
        }),
    )];

    run_health_checks(checks).await
}
