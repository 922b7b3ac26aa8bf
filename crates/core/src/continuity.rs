//! Mileage and fuel continuity checks.
//!
//! A new reading is compared against the vehicle's last recorded mileage and
//! against the driver's immediately preceding inspection on that vehicle.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;
use crate::lifecycle::InspectionKind;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Readings above this are treated as typos rather than odometer values.
pub const DEFAULT_MAX_MILEAGE: i64 = 1_000_000;

/// Allowed drift between a post-trip reading and the preceding pre-trip.
pub const DEFAULT_POST_TRIP_TOLERANCE: i64 = 1;

pub const MIN_FUEL_LEVEL: f64 = 0.0;
pub const MAX_FUEL_LEVEL: f64 = 100.0;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How a post-trip reading is compared with the preceding pre-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostTripMode {
    Off,
    Strict,
    Tolerance(i64),
}

/// What happens when the post-trip rule is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Accept the reading and report a warning.
    Warn,
    /// Reject the reading with a validation error.
    Reject,
}

impl FromStr for Enforcement {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(Enforcement::Warn),
            "reject" => Ok(Enforcement::Reject),
            other => Err(CoreError::Validation(format!(
                "Unknown enforcement '{other}'. Must be one of: warn, reject"
            ))),
        }
    }
}

impl PostTripMode {
    /// Build a mode from its configuration name and tolerance.
    pub fn parse(name: &str, tolerance: i64) -> Result<Self, CoreError> {
        match name {
            "off" => Ok(PostTripMode::Off),
            "strict" => Ok(PostTripMode::Strict),
            "tolerance" if tolerance >= 0 => Ok(PostTripMode::Tolerance(tolerance)),
            "tolerance" => Err(CoreError::Validation(format!(
                "Post-trip tolerance must be non-negative, got {tolerance}"
            ))),
            other => Err(CoreError::Validation(format!(
                "Unknown post-trip mode '{other}'. Must be one of: off, strict, tolerance"
            ))),
        }
    }

    fn allowed_drift(self) -> Option<i64> {
        match self {
            PostTripMode::Off => None,
            PostTripMode::Strict => Some(0),
            PostTripMode::Tolerance(t) => Some(t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MileagePolicy {
    pub max_mileage: i64,
    pub post_trip_mode: PostTripMode,
    pub enforcement: Enforcement,
}

impl Default for MileagePolicy {
    fn default() -> Self {
        Self {
            max_mileage: DEFAULT_MAX_MILEAGE,
            post_trip_mode: PostTripMode::Tolerance(DEFAULT_POST_TRIP_TOLERANCE),
            enforcement: Enforcement::Warn,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// The numeric part of an inspection being submitted or edited.
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub kind: InspectionKind,
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
}

/// The driver's immediately preceding completed inspection on the vehicle.
#[derive(Debug, Clone, Copy)]
pub struct PriorTrip {
    pub kind: InspectionKind,
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
}

/// A non-fatal continuity finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinuityWarning {
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for ContinuityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuityReport {
    /// The validated start mileage.
    pub start_mileage: i64,
    pub warnings: Vec<ContinuityWarning>,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Validate a start mileage against the sanity ceiling and the vehicle's
/// last recorded value. A vehicle with no recorded mileage accepts any
/// in-range reading.
pub fn validate_start_mileage(
    start_mileage: Option<i64>,
    vehicle_mileage: Option<i64>,
    policy: &MileagePolicy,
) -> Result<i64, CoreError> {
    let start = start_mileage
        .ok_or_else(|| CoreError::Validation("start_mileage is required".into()))?;

    if start < 0 {
        return Err(CoreError::Validation(format!(
            "start_mileage must be non-negative, got {start}"
        )));
    }
    if start > policy.max_mileage {
        return Err(CoreError::Validation(format!(
            "start_mileage {start} exceeds the maximum of {}",
            policy.max_mileage
        )));
    }
    if let Some(current) = vehicle_mileage {
        if start < current {
            return Err(CoreError::Validation(format!(
                "Start mileage cannot be less than vehicle's current mileage ({current})"
            )));
        }
    }
    Ok(start)
}

/// Validate an optional fuel percentage.
pub fn validate_fuel_level(fuel_level: Option<f64>) -> Result<(), CoreError> {
    match fuel_level {
        Some(level) if !(MIN_FUEL_LEVEL..=MAX_FUEL_LEVEL).contains(&level) => {
            Err(CoreError::Validation(format!(
                "fuel_level must be between 0 and 100, got {level}"
            )))
        }
        _ => Ok(()),
    }
}

/// Compare a post-trip reading with the preceding pre-trip.
///
/// Returns `Ok(None)` when the rule does not apply or is satisfied.
pub fn check_post_trip(
    kind: InspectionKind,
    start_mileage: i64,
    prior: Option<&PriorTrip>,
    policy: &MileagePolicy,
) -> Result<Option<ContinuityWarning>, CoreError> {
    let Some(drift) = policy.post_trip_mode.allowed_drift() else {
        return Ok(None);
    };
    if kind != InspectionKind::PostTrip {
        return Ok(None);
    }
    let Some(pre_start) = prior
        .filter(|p| p.kind == InspectionKind::PreTrip)
        .and_then(|p| p.start_mileage)
    else {
        return Ok(None);
    };

    if (start_mileage - pre_start).abs() <= drift {
        return Ok(None);
    }

    let message = format!(
        "Post-trip mileage {start_mileage} does not match pre-trip mileage {pre_start} \
         (allowed difference {drift})"
    );
    match policy.enforcement {
        Enforcement::Reject => Err(CoreError::Validation(message)),
        Enforcement::Warn => Ok(Some(ContinuityWarning {
            code: "POST_TRIP_MILEAGE_MISMATCH",
            message,
        })),
    }
}

/// Run every continuity check for a reading.
pub fn validate(
    reading: &Reading,
    vehicle_mileage: Option<i64>,
    prior: Option<&PriorTrip>,
    policy: &MileagePolicy,
) -> Result<ContinuityReport, CoreError> {
    let start_mileage = validate_start_mileage(reading.start_mileage, vehicle_mileage, policy)?;
    validate_fuel_level(reading.fuel_level)?;

    let warnings = check_post_trip(reading.kind, start_mileage, prior, policy)?
        .into_iter()
        .collect();

    Ok(ContinuityReport {
        start_mileage,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Fuel consumed since the previous inspection, in percentage points.
///
/// `None` when either endpoint is unknown.
pub fn fuel_used_since_last(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    Some(previous? - current?)
}

/// Distance driven since the previous inspection.
pub fn miles_since_last(previous: Option<i64>, current: Option<i64>) -> Option<i64> {
    Some(current? - previous?)
}
