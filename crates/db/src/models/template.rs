//! Inspection template models (read-only from this service).

use serde::Serialize;
use sqlx::FromRow;
use tripcheck_core::types::{DbId, Timestamp};

/// A row from the `templates` table. `org_id = None` marks a shared template.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Template {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
}
