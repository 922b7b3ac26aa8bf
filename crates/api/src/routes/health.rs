use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Open WebSocket connections across all organization rooms.
    pub ws_connections: usize,
    /// Receivers attached to the event bus.
    pub event_subscribers: usize,
}

/// GET /health -- service, database and WebSocket status.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = tripcheck_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        ws_connections: state.ws_manager.connection_count().await,
        event_subscribers: state.event_bus.subscriber_count(),
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
