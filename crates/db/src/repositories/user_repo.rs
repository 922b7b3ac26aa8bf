//! Repository for the `users` table.

use sqlx::PgPool;
use tripcheck_core::types::DbId;

use crate::models::user::User;

const COLUMNS: &str = "id, email, first_name, last_name, role, org_id, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a user into (or out of, with `None`) an organization.
    pub async fn set_org(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET org_id = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }
}
