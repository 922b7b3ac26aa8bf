//! Repository for the `inspection_photos` table.

use sqlx::PgPool;
use tripcheck_core::types::DbId;

use crate::models::photo::{CreateInspectionPhoto, InspectionPhoto};

const COLUMNS: &str = "id, inspection_id, template_item_id, driver_id, url, uploaded_at";

pub struct PhotoRepo;

impl PhotoRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateInspectionPhoto,
    ) -> Result<InspectionPhoto, sqlx::Error> {
        let query = format!(
            "INSERT INTO inspection_photos (inspection_id, template_item_id, driver_id, url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InspectionPhoto>(&query)
            .bind(input.inspection_id)
            .bind(input.template_item_id)
            .bind(input.driver_id)
            .bind(&input.url)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_inspection(
        pool: &PgPool,
        inspection_id: DbId,
    ) -> Result<Vec<InspectionPhoto>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inspection_photos
             WHERE inspection_id = $1
             ORDER BY uploaded_at, id"
        );
        sqlx::query_as::<_, InspectionPhoto>(&query)
            .bind(inspection_id)
            .fetch_all(pool)
            .await
    }
}
