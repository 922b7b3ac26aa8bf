//! Repository for the `organizations` table.

use sqlx::PgPool;

use crate::models::organization::Organization;

const COLUMNS: &str = "id, name, invite_code, created_at, updated_at";

pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn find_by_invite_code(
        pool: &PgPool,
        invite_code: &str,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE invite_code = $1");
        sqlx::query_as::<_, Organization>(&query)
            .bind(invite_code)
            .fetch_optional(pool)
            .await
    }
}
