//! Handlers for `/inspections/{id}/photos`.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tripcheck_core::access::authorize;
use tripcheck_core::error::CoreError;
use tripcheck_core::photos::validate_photo;
use tripcheck_core::types::DbId;
use tripcheck_db::models::inspection::Inspection;
use tripcheck_db::models::photo::{CreateInspectionPhoto, InspectionPhoto};
use tripcheck_db::repositories::{InspectionRepo, PhotoRepo, TemplateRepo};

use crate::engine::Caller;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireDriver;
use crate::state::AppState;
use crate::storage::photo_key;

/// POST /api/v1/inspections/{id}/photos
///
/// Accepts a multipart form with a required `file` field and an optional
/// `item_id` naming the template item the photo documents. Only the
/// inspecting driver may attach photos.
pub async fn upload(
    State(state): State<AppState>,
    RequireDriver(auth): RequireDriver,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<InspectionPhoto>)> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let inspection = find_inspection(&state, id).await?;
    if !inspection.owner().is_driver(caller.actor.id) {
        return Err(CoreError::Forbidden(
            "Only the inspecting driver can attach photos".into(),
        )
        .into());
    }

    let mut file_data: Option<(String, Vec<u8>)> = None;
    let mut item_id: Option<DbId> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("photo").to_string();
                let data = field.bytes().await?;
                file_data = Some((filename, data.to_vec()));
            }
            "item_id" => {
                let text = field.text().await?;
                let parsed = text.trim().parse::<DbId>().map_err(|_| {
                    AppError::BadRequest(format!("item_id must be an integer, got '{text}'"))
                })?;
                item_id = Some(parsed);
            }
            _ => {}
        }
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let ext = validate_photo(&filename, data.len())?;

    if let Some(item_id) = item_id {
        let belongs = match inspection.template_id {
            Some(template_id) => {
                TemplateRepo::item_belongs_to(&state.pool, template_id, item_id).await?
            }
            None => false,
        };
        if !belongs {
            return Err(CoreError::Validation(format!(
                "Template item {item_id} is not part of this inspection's template"
            ))
            .into());
        }
    }

    let key = photo_key(id, &data, &ext);
    let size = data.len();
    let url = state.storage.put(&key, data).await?;

    let photo = PhotoRepo::create(
        &state.pool,
        &CreateInspectionPhoto {
            inspection_id: id,
            template_item_id: item_id,
            driver_id: caller.actor.id,
            url,
        },
    )
    .await?;

    tracing::info!(inspection_id = id, photo_id = photo.id, size, "Inspection photo stored");
    Ok((StatusCode::CREATED, Json(photo)))
}

/// GET /api/v1/inspections/{id}/photos
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<InspectionPhoto>>> {
    let caller = Caller::resolve(&state.pool, &auth).await?;
    let inspection = find_inspection(&state, id).await?;
    authorize(&caller.actor, &inspection.access_scope())?;

    let photos = PhotoRepo::list_by_inspection(&state.pool, id).await?;
    Ok(Json(photos))
}

async fn find_inspection(state: &AppState, id: DbId) -> AppResult<Inspection> {
    InspectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Inspection",
            id,
        }))
}
