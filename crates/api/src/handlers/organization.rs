//! Handlers for organization membership (`/organizations/join`, `/leave`).
//!
//! Membership changes move the driver's open WebSocket connections to the
//! new room and are announced to the affected organizations.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tripcheck_core::error::CoreError;
use tripcheck_core::types::DbId;
use tripcheck_db::models::organization::Organization;
use tripcheck_db::models::user::User;
use tripcheck_db::repositories::{OrganizationRepo, UserRepo};
use tripcheck_events::{EVENT_DRIVER_JOINED, EVENT_DRIVER_LEFT};
use validator::Validate;

use crate::engine::Caller;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireDriver;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct JoinOrganization {
    #[validate(length(min = 1, max = 64))]
    pub invite_code: String,
}

/// The caller's membership after a join or leave.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub user: User,
    pub organization: Option<Organization>,
}

/// POST /api/v1/organizations/join
///
/// Joining a new organization implicitly leaves the current one.
pub async fn join(
    State(state): State<AppState>,
    RequireDriver(auth): RequireDriver,
    Json(input): Json<JoinOrganization>,
) -> AppResult<Json<MembershipResponse>> {
    input.validate()?;
    let caller = Caller::resolve(&state.pool, &auth).await?;

    let organization = OrganizationRepo::find_by_invite_code(&state.pool, input.invite_code.trim())
        .await?
        .ok_or_else(|| CoreError::Validation("Invalid invite code".into()))?;

    let previous = caller.user.org_id;
    if previous == Some(organization.id) {
        return Ok(Json(MembershipResponse {
            user: caller.user,
            organization: Some(organization),
        }));
    }

    let user = set_membership(&state, auth.user_id, Some(organization.id)).await?;
    if let Some(previous) = previous {
        announce(&state, previous, EVENT_DRIVER_LEFT, &user);
    }
    announce(&state, organization.id, EVENT_DRIVER_JOINED, &user);

    tracing::info!(
        user_id = user.id,
        org_id = organization.id,
        previous_org_id = ?previous,
        "Driver joined organization"
    );
    Ok(Json(MembershipResponse {
        user,
        organization: Some(organization),
    }))
}

/// POST /api/v1/organizations/leave
pub async fn leave(
    State(state): State<AppState>,
    RequireDriver(auth): RequireDriver,
) -> AppResult<Json<MembershipResponse>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let org_id = caller.user.org_id.ok_or_else(|| {
        CoreError::Validation("You are not a member of any organization".into())
    })?;

    let user = set_membership(&state, auth.user_id, None).await?;
    announce(&state, org_id, EVENT_DRIVER_LEFT, &user);

    tracing::info!(user_id = user.id, org_id, "Driver left organization");
    Ok(Json(MembershipResponse {
        user,
        organization: None,
    }))
}

async fn set_membership(
    state: &AppState,
    user_id: DbId,
    org_id: Option<DbId>,
) -> AppResult<User> {
    let user = UserRepo::set_org(&state.pool, user_id, org_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    let moved = state.ws_manager.set_user_org(user_id, org_id).await;
    tracing::debug!(user_id, ?org_id, moved, "Moved WebSocket connections");
    Ok(user)
}

fn announce(state: &AppState, org_id: DbId, event_type: &str, user: &User) {
    state.notifier.publish(
        Some(org_id),
        event_type,
        Some(("user", user.id)),
        Some(user.id),
        json!({
            "driver_id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "full_name": user.display_name(),
        }),
    );
}
