//! Route definitions for the `/inspections` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tripcheck_core::photos::MAX_PHOTO_BYTES;

use crate::handlers::{inspection, photo};
use crate::state::AppState;

/// Headroom over the photo limit for multipart framing and form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/inspections`.
///
/// ```text
/// POST   /start           -> start
/// POST   /submit          -> submit
/// GET    /history         -> history
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// GET    /{id}/photos     -> photo::list
/// POST   /{id}/photos     -> photo::upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(inspection::start))
        .route("/submit", post(inspection::submit))
        .route("/history", get(inspection::history))
        .route(
            "/{id}",
            get(inspection::get_by_id).put(inspection::update),
        )
        .route(
            "/{id}/photos",
            get(photo::list)
                .post(photo::upload)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
}
