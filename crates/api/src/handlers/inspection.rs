//! Handlers for the `/inspections` and `/vehicles/{id}/inspections` resources.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tripcheck_core::types::DbId;
use tripcheck_db::models::inspection::{HistoryFilter, InspectionView, UpdateInspection};
use validator::Validate;

use crate::engine::{Caller, InspectionService, StartInspection, SubmitInspection};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/inspections/start
///
/// Returns the caller's open draft for the vehicle and template, creating it
/// on first call.
pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<StartInspection>,
) -> AppResult<Json<InspectionView>> {
    input.validate()?;
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let view = InspectionService::from_state(&state)
        .start(&caller, &input)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/inspections/submit
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SubmitInspection>,
) -> AppResult<(StatusCode, Json<InspectionView>)> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let view = InspectionService::from_state(&state)
        .submit(&caller, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/v1/inspections/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateInspection>,
) -> AppResult<Json<InspectionView>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let view = InspectionService::from_state(&state)
        .update(&caller, id, &input)
        .await?;
    Ok(Json(view))
}

/// GET /api/v1/inspections/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<InspectionView>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let view = InspectionService::from_state(&state).get(&caller, id).await?;
    Ok(Json(view))
}

/// GET /api/v1/inspections/history?driver_id=&vehicle_id=&include_drafts=&limit=&offset=
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<Vec<InspectionView>>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let views = InspectionService::from_state(&state)
        .history(&caller, &filter)
        .await?;
    Ok(Json(views))
}

/// GET /api/v1/vehicles/{vehicle_id}/inspections/last
///
/// Responds with `null` when the caller can see no completed inspection
/// on the vehicle.
pub async fn last_for_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vehicle_id): Path<DbId>,
) -> AppResult<Json<Option<InspectionView>>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let view = InspectionService::from_state(&state)
        .last_for_vehicle(&caller, vehicle_id)
        .await?;
    Ok(Json(view))
}
