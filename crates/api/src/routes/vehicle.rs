use axum::routing::get;
use axum::Router;

use crate::handlers::inspection;
use crate::state::AppState;

/// Routes mounted at `/vehicles`.
///
/// ```text
/// GET    /{vehicle_id}/inspections/last   -> inspection::last_for_vehicle
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{vehicle_id}/inspections/last",
        get(inspection::last_for_vehicle),
    )
}
