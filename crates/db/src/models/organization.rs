//! Organization entity model.

use serde::Serialize;
use sqlx::FromRow;
use tripcheck_core::types::{DbId, Timestamp};

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    #[serde(skip_serializing)]
    pub invite_code: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
