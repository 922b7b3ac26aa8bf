//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! match. Finer-grained rules (organization scope, ownership, the edit
//! window) live in the inspection engine.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tripcheck_core::error::CoreError;
use tripcheck_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `driver` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn join(RequireDriver(user): RequireDriver) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireDriver(pub AuthUser);

impl FromRequestParts<AppState> for RequireDriver {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Driver {
            return Err(AppError::Core(CoreError::Forbidden(
                "Driver role required".into(),
            )));
        }
        Ok(RequireDriver(user))
    }
}
