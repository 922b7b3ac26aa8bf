//! Inspection entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tripcheck_core::access::{InspectionScope, Owner, Scope};
use tripcheck_core::continuity::{fuel_used_since_last, miles_since_last, ContinuityWarning};
use tripcheck_core::error::CoreError;
use tripcheck_core::lifecycle::{InspectionKind, Stage};
use tripcheck_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::user::DriverSnapshot;

/// A row from the `inspections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Inspection {
    pub id: DbId,
    pub driver_id: Option<DbId>,
    pub vehicle_id: Option<DbId>,
    pub template_id: Option<DbId>,
    pub org_id: Option<DbId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub results: serde_json::Value,
    pub notes: Option<String>,
    pub is_draft: bool,
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
    pub fuel_notes: Option<String>,
    pub odometer_verified: bool,
    pub driver_first_name: Option<String>,
    pub driver_last_name: Option<String>,
    pub driver_full_name: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Inspection {
    pub fn access_scope(&self) -> InspectionScope {
        InspectionScope::from_columns(self.driver_id, self.org_id)
    }

    pub fn owner(&self) -> Owner {
        Owner::from_column(self.driver_id)
    }

    pub fn scope(&self) -> Scope {
        Scope::from_column(self.org_id)
    }

    /// Parse the stored kind. The column has a CHECK constraint, so a failure
    /// here means the row was written outside this service.
    pub fn kind(&self) -> Result<InspectionKind, CoreError> {
        self.kind
            .parse()
            .map_err(|_| CoreError::Internal(format!("Inspection {} has kind '{}'", self.id, self.kind)))
    }
}

/// DTO for opening a new draft.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub driver_id: DbId,
    pub vehicle_id: DbId,
    pub template_id: Option<DbId>,
    pub org_id: Option<DbId>,
    pub kind: InspectionKind,
    pub snapshot: DriverSnapshot,
}

/// Validated content written when an inspection is finalized.
#[derive(Debug, Clone)]
pub struct SubmittedFields {
    pub results: serde_json::Value,
    pub notes: Option<String>,
    pub start_mileage: i64,
    pub fuel_level: Option<f64>,
    pub fuel_notes: Option<String>,
    pub odometer_verified: bool,
}

/// DTO for creating an already-finalized inspection (no draft was started).
#[derive(Debug, Clone)]
pub struct NewCompleted {
    pub driver_id: DbId,
    pub vehicle_id: DbId,
    pub template_id: DbId,
    pub org_id: Option<DbId>,
    pub kind: InspectionKind,
    pub snapshot: DriverSnapshot,
    pub fields: SubmittedFields,
}

/// DTO for editing a submitted inspection. All fields are optional; kind and
/// ownership are not editable.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInspection {
    pub results: Option<serde_json::Value>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
    #[validate(length(max = 1000))]
    pub fuel_notes: Option<String>,
    pub odometer_verified: Option<bool>,
}

/// Query parameters for the scoped history listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub driver_id: Option<DbId>,
    pub vehicle_id: Option<DbId>,
    #[serde(default)]
    pub include_drafts: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Readings of the completed inspection preceding another on its vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorReading {
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
}

impl From<&Inspection> for PriorReading {
    fn from(row: &Inspection) -> Self {
        Self {
            start_mileage: row.start_mileage,
            fuel_level: row.fuel_level,
        }
    }
}

/// A history listing row: the inspection plus its predecessor's readings.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    #[sqlx(flatten)]
    pub inspection: Inspection,
    pub prev_start_mileage: Option<i64>,
    pub prev_fuel_level: Option<f64>,
}

impl HistoryRow {
    pub fn into_parts(self) -> (Inspection, PriorReading) {
        let prior = PriorReading {
            start_mileage: self.prev_start_mileage,
            fuel_level: self.prev_fuel_level,
        };
        (self.inspection, prior)
    }
}

/// An inspection composed with the values derived from its predecessor on
/// the same vehicle and its lifecycle stage.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionView {
    #[serde(flatten)]
    pub inspection: Inspection,
    /// Distance driven since the preceding inspection on this vehicle.
    pub mileage: Option<i64>,
    pub fuel_used_since_last: Option<f64>,
    #[serde(flatten)]
    pub stage: Stage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ContinuityWarning>,
}

impl InspectionView {
    pub fn compose(inspection: Inspection, preceding: Option<PriorReading>, stage: Stage) -> Self {
        let preceding = preceding.unwrap_or_default();
        let mileage = miles_since_last(preceding.start_mileage, inspection.start_mileage);
        let fuel_used_since_last = fuel_used_since_last(preceding.fuel_level, inspection.fuel_level);
        Self {
            inspection,
            mileage,
            fuel_used_since_last,
            stage,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<ContinuityWarning>) -> Self {
        self.warnings = warnings;
        self
    }
}
