//! Repository for the `vehicles` table.

use sqlx::{PgConnection, PgPool};
use tripcheck_core::types::DbId;

use crate::models::vehicle::Vehicle;

const COLUMNS: &str = "id, org_id, license_plate, make, model, year, vin, mileage, status, \
    created_at, updated_at";

/// Vehicle reads and the mileage sync performed by submissions.
pub struct VehicleRepo;

impl VehicleRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read and row-lock a vehicle so concurrent submissions serialize their
    /// mileage check and sync.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Advance the recorded mileage. Never lowers it.
    pub async fn advance_mileage(
        conn: &mut PgConnection,
        id: DbId,
        mileage: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>(
            "UPDATE vehicles SET
                mileage = GREATEST(COALESCE(mileage, 0), $2),
                updated_at = NOW()
             WHERE id = $1
             RETURNING mileage",
        )
        .bind(id)
        .bind(mileage)
        .fetch_one(conn)
        .await
    }
}
