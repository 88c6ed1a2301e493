//! Readiness endpoint; liveness (`/health`) comes from `axum_helpers::health_router`.

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};
use database::mongodb::check_health;

use crate::state::AppState;

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "mongodb",
        Box::pin(async {
            check_health(&state.mongo_client)
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    run_health_checks(checks).await
}

/// `GET /ready`, served as `/api/ready`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
}
