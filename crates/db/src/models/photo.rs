//! Inspection photo model and DTO.

use serde::Serialize;
use sqlx::FromRow;
use tripcheck_core::types::{DbId, Timestamp};

/// A row from the `inspection_photos` table. Only the storage URL is kept;
/// the blob itself lives in object storage.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InspectionPhoto {
    pub id: DbId,
    pub inspection_id: DbId,
    pub template_item_id: Option<DbId>,
    pub driver_id: Option<DbId>,
    pub url: String,
    pub uploaded_at: Timestamp,
}

/// DTO for recording an uploaded photo.
#[derive(Debug, Clone)]
pub struct CreateInspectionPhoto {
    pub inspection_id: DbId,
    pub template_item_id: Option<DbId>,
    pub driver_id: DbId,
    pub url: String,
}
