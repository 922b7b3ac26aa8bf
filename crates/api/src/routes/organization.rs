use axum::routing::post;
use axum::Router;

use crate::handlers::organization;
use crate::state::AppState;

/// Routes mounted at `/organizations`.
///
/// ```text
/// POST   /join    -> join
/// POST   /leave   -> leave
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/join", post(organization::join))
        .route("/leave", post(organization::leave))
}
