//! Read access to `templates` and `template_items`.

use sqlx::PgPool;
use tripcheck_core::types::DbId;

use crate::models::template::Template;

const COLUMNS: &str = "id, org_id, name, description, is_default, is_active, created_at";

pub struct TemplateRepo;

impl TemplateRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `item_id` belongs to `template_id`.
    pub async fn item_belongs_to(
        pool: &PgPool,
        template_id: DbId,
        item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM template_items WHERE id = $1 AND template_id = $2)",
        )
        .bind(item_id)
        .bind(template_id)
        .fetch_one(pool)
        .await
    }
}
