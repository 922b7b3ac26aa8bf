pub mod health;
pub mod inspection;
pub mod organization;
pub mod vehicle;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=                                       WebSocket (org room)
///
/// /inspections/start                               start or resume draft (POST)
/// /inspections/submit                              finalize / create (POST)
/// /inspections/history                             scoped history (GET)
/// /inspections/{id}                                get, update (GET, PUT)
/// /inspections/{id}/photos                         list, upload (GET, POST)
///
/// /vehicles/{vehicle_id}/inspections/last          last visible inspection (GET)
///
/// /organizations/join                              join by invite code (POST)
/// /organizations/leave                             leave current org (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/inspections", inspection::router())
        .nest("/vehicles", vehicle::router())
        .nest("/organizations", organization::router())
}
