//! Vehicle entity model.

use serde::Serialize;
use sqlx::FromRow;
use tripcheck_core::types::{DbId, Timestamp};

/// A row from the `vehicles` table.
///
/// `mileage` is the last odometer reading accepted by a submission; `None`
/// until the first inspection is submitted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vehicle {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub mileage: Option<i64>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
