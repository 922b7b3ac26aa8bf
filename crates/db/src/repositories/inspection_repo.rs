//! Repository for the `inspections` table.
//!
//! Methods that take `&mut PgConnection` are meant to run inside a caller's
//! transaction (`&mut *tx`); methods that take `&PgPool` are standalone reads.

use sqlx::{PgConnection, PgPool};
use tripcheck_core::access::ScopeFilter;
use tripcheck_core::lifecycle::InspectionKind;
use tripcheck_core::types::{DbId, Timestamp};

use crate::models::inspection::{
    HistoryFilter, HistoryRow, Inspection, NewCompleted, NewDraft, SubmittedFields, UpdateInspection,
};
use crate::models::user::DriverSnapshot;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, driver_id, vehicle_id, template_id, org_id, kind, results, notes, \
    is_draft, start_mileage, fuel_level, fuel_notes, odometer_verified, \
    driver_first_name, driver_last_name, driver_full_name, \
    created_at, completed_at, updated_at";

/// Default and maximum page size for history listings.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// Provides lifecycle and query operations for inspections.
pub struct InspectionRepo;

impl InspectionRepo {
    // ── Reads ────────────────────────────────────────────────────────

    /// Find an inspection by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inspections WHERE id = $1");
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and row-lock an inspection inside a transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inspections WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find the open draft for a (driver, vehicle, template) triple.
    ///
    /// A `None` template matches drafts started without one.
    pub async fn find_open_draft(
        conn: &mut PgConnection,
        driver_id: DbId,
        vehicle_id: DbId,
        template_id: Option<DbId>,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inspections
             WHERE is_draft
               AND driver_id = $1
               AND vehicle_id = $2
               AND template_id IS NOT DISTINCT FROM $3
             FOR UPDATE"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(driver_id)
            .bind(vehicle_id)
            .bind(template_id)
            .fetch_optional(conn)
            .await
    }

    /// Kind of the most recent completed inspection for a driver on a
    /// vehicle within an organization scope.
    pub async fn last_completed_kind(
        conn: &mut PgConnection,
        driver_id: DbId,
        vehicle_id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT kind FROM inspections
             WHERE NOT is_draft
               AND driver_id = $1
               AND vehicle_id = $2
               AND org_id IS NOT DISTINCT FROM $3
             ORDER BY completed_at DESC NULLS LAST, id DESC
             LIMIT 1",
        )
        .bind(driver_id)
        .bind(vehicle_id)
        .bind(org_id)
        .fetch_optional(conn)
        .await
    }

    /// The driver's completed inspection on a vehicle that precedes
    /// `before` (a `(completed_at, id)` position), or the latest one when
    /// `before` is `None`.
    pub async fn previous_completed_for_driver(
        conn: &mut PgConnection,
        driver_id: DbId,
        vehicle_id: DbId,
        before: Option<(Timestamp, DbId)>,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let (completed_at, id) = before.unzip();
        let query = format!(
            "SELECT {COLUMNS} FROM inspections
             WHERE NOT is_draft
               AND driver_id = $1
               AND vehicle_id = $2
               AND ($3::timestamptz IS NULL OR (completed_at, id) < ($3, $4))
             ORDER BY completed_at DESC NULLS LAST, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(driver_id)
            .bind(vehicle_id)
            .bind(completed_at)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The completed inspection on the same vehicle immediately before the
    /// given one, by completion time.
    pub async fn preceding_on_vehicle(
        pool: &PgPool,
        vehicle_id: DbId,
        completed_at: Timestamp,
        id: DbId,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inspections
             WHERE NOT is_draft
               AND vehicle_id = $1
               AND (completed_at, id) < ($2, $3)
             ORDER BY completed_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(vehicle_id)
            .bind(completed_at)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent completed inspection on a vehicle visible under `scope`.
    pub async fn last_for_vehicle(
        pool: &PgPool,
        scope: &ScopeFilter,
        vehicle_id: DbId,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let (clause, scope_binds) = scope_clause(scope, 1);
        let vehicle_param = scope_binds.len() + 1;
        let query = format!(
            "SELECT {COLUMNS} FROM inspections
             WHERE {clause}
               AND NOT is_draft
               AND vehicle_id = ${vehicle_param}
             ORDER BY completed_at DESC NULLS LAST, id DESC
             LIMIT 1"
        );
        let mut q = sqlx::query_as::<_, Inspection>(&query);
        for id in scope_binds {
            q = q.bind(id);
        }
        q.bind(vehicle_id).fetch_optional(pool).await
    }

    /// List inspections visible under `scope`, newest first.
    ///
    /// Each row carries the readings of the completed inspection that
    /// preceded it on the same vehicle, whoever performed it.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &ScopeFilter,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryRow>, sqlx::Error> {
        let (clause, mut binds) = scope_clause(scope, 1);
        let mut page = format!("SELECT {COLUMNS} FROM inspections WHERE {clause}");

        if !filter.include_drafts {
            page.push_str(" AND NOT is_draft");
        }
        if let Some(driver_id) = filter.driver_id {
            binds.push(driver_id);
            page.push_str(&format!(" AND driver_id = ${}", binds.len()));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            binds.push(vehicle_id);
            page.push_str(&format!(" AND vehicle_id = ${}", binds.len()));
        }

        let limit = filter
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let offset = filter.offset.unwrap_or(0).max(0);
        page.push_str(&format!(
            " ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            binds.len() + 1,
            binds.len() + 2
        ));

        let query = format!(
            "WITH page AS ({page})
             SELECT page.*,
                    prev.start_mileage AS prev_start_mileage,
                    prev.fuel_level AS prev_fuel_level
             FROM page
             LEFT JOIN LATERAL (
                 SELECT p.start_mileage, p.fuel_level
                 FROM inspections p
                 WHERE NOT p.is_draft
                   AND p.vehicle_id = page.vehicle_id
                   AND page.completed_at IS NOT NULL
                   AND (p.completed_at, p.id) < (page.completed_at, page.id)
                 ORDER BY p.completed_at DESC, p.id DESC
                 LIMIT 1
             ) prev ON TRUE
             ORDER BY page.created_at DESC, page.id DESC"
        );

        let mut q = sqlx::query_as::<_, HistoryRow>(&query);
        for id in binds {
            q = q.bind(id);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    // ── Writes (transactional) ───────────────────────────────────────

    /// Insert a draft unless one already exists for the triple.
    ///
    /// Returns `None` when a concurrent request won the race; the caller
    /// should re-read with [`find_open_draft`](Self::find_open_draft).
    pub async fn insert_draft(
        conn: &mut PgConnection,
        input: &NewDraft,
    ) -> Result<Option<Inspection>, sqlx::Error> {
        let query = format!(
            "INSERT INTO inspections
                (driver_id, vehicle_id, template_id, org_id, kind, is_draft,
                 driver_first_name, driver_last_name, driver_full_name)
             VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8)
             ON CONFLICT (driver_id, vehicle_id, (COALESCE(template_id, 0))) WHERE is_draft
             DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(input.driver_id)
            .bind(input.vehicle_id)
            .bind(input.template_id)
            .bind(input.org_id)
            .bind(input.kind.as_str())
            .bind(&input.snapshot.first_name)
            .bind(&input.snapshot.last_name)
            .bind(&input.snapshot.full_name)
            .fetch_optional(conn)
            .await
    }

    /// Insert an inspection that skips the draft stage.
    pub async fn insert_completed(
        conn: &mut PgConnection,
        input: &NewCompleted,
    ) -> Result<Inspection, sqlx::Error> {
        let query = format!(
            "INSERT INTO inspections
                (driver_id, vehicle_id, template_id, org_id, kind, is_draft,
                 results, notes, start_mileage, fuel_level, fuel_notes, odometer_verified,
                 driver_first_name, driver_last_name, driver_full_name, completed_at)
             VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
             RETURNING {COLUMNS}"
        );
        let f = &input.fields;
        sqlx::query_as::<_, Inspection>(&query)
            .bind(input.driver_id)
            .bind(input.vehicle_id)
            .bind(input.template_id)
            .bind(input.org_id)
            .bind(input.kind.as_str())
            .bind(&f.results)
            .bind(&f.notes)
            .bind(f.start_mileage)
            .bind(f.fuel_level)
            .bind(&f.fuel_notes)
            .bind(f.odometer_verified)
            .bind(&input.snapshot.first_name)
            .bind(&input.snapshot.last_name)
            .bind(&input.snapshot.full_name)
            .fetch_one(conn)
            .await
    }

    /// Finalize a draft in place.
    pub async fn finalize(
        conn: &mut PgConnection,
        id: DbId,
        vehicle_id: DbId,
        template_id: DbId,
        fields: &SubmittedFields,
        snapshot: &DriverSnapshot,
    ) -> Result<Inspection, sqlx::Error> {
        let query = format!(
            "UPDATE inspections SET
                is_draft = FALSE,
                vehicle_id = $2,
                template_id = $3,
                results = $4,
                notes = $5,
                start_mileage = $6,
                fuel_level = $7,
                fuel_notes = $8,
                odometer_verified = $9,
                driver_first_name = $10,
                driver_last_name = $11,
                driver_full_name = $12,
                completed_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .bind(vehicle_id)
            .bind(template_id)
            .bind(&fields.results)
            .bind(&fields.notes)
            .bind(fields.start_mileage)
            .bind(fields.fuel_level)
            .bind(&fields.fuel_notes)
            .bind(fields.odometer_verified)
            .bind(&snapshot.first_name)
            .bind(&snapshot.last_name)
            .bind(&snapshot.full_name)
            .fetch_one(conn)
            .await
    }

    /// Apply a partial edit. Only non-`None` fields in `input` are written.
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateInspection,
    ) -> Result<Inspection, sqlx::Error> {
        let query = format!(
            "UPDATE inspections SET
                results = COALESCE($2, results),
                notes = COALESCE($3, notes),
                start_mileage = COALESCE($4, start_mileage),
                fuel_level = COALESCE($5, fuel_level),
                fuel_notes = COALESCE($6, fuel_notes),
                odometer_verified = COALESCE($7, odometer_verified),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Inspection>(&query)
            .bind(id)
            .bind(&input.results)
            .bind(&input.notes)
            .bind(input.start_mileage)
            .bind(input.fuel_level)
            .bind(&input.fuel_notes)
            .bind(input.odometer_verified)
            .fetch_one(conn)
            .await
    }

    /// Delete every draft for (driver, vehicle) except `keep_id`.
    /// Returns the number of drafts removed.
    pub async fn delete_stale_drafts(
        conn: &mut PgConnection,
        driver_id: DbId,
        vehicle_id: DbId,
        keep_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM inspections
             WHERE is_draft AND driver_id = $1 AND vehicle_id = $2 AND id <> $3",
        )
        .bind(driver_id)
        .bind(vehicle_id)
        .bind(keep_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count open drafts for (driver, vehicle). Used by tests and diagnostics.
    pub async fn count_drafts(
        pool: &PgPool,
        driver_id: DbId,
        vehicle_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inspections WHERE is_draft AND driver_id = $1 AND vehicle_id = $2",
        )
        .bind(driver_id)
        .bind(vehicle_id)
        .fetch_one(pool)
        .await
    }
}

/// Parse a stored kind, treating unknown values as "no history".
pub fn parse_kind(kind: Option<String>) -> Option<InspectionKind> {
    kind.and_then(|k| k.parse().ok())
}

/// Render a [`ScopeFilter`] as a SQL predicate whose placeholders start at
/// `$first_param`, returning the values to bind in order.
pub fn scope_clause(scope: &ScopeFilter, first_param: usize) -> (String, Vec<DbId>) {
    let p = first_param;
    match *scope {
        ScopeFilter::Organization { org_id } => (format!("org_id = ${p}"), vec![org_id]),
        ScopeFilter::DriverInOrganization { driver_id, org_id } => (
            format!(
                "(driver_id = ${p} OR (driver_id IS NULL AND org_id = ${}))",
                p + 1
            ),
            vec![driver_id, org_id],
        ),
        ScopeFilter::OwnOnly { driver_id } => (format!("driver_id = ${p}"), vec![driver_id]),
    }
}
