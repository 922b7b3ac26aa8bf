//! User (driver/admin) entity model.

use serde::Serialize;
use sqlx::FromRow;
use tripcheck_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub org_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Name fields copied onto an inspection so history survives driver deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

impl From<&User> for DriverSnapshot {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.display_name(),
        }
    }
}
