//! Inspection lifecycle rules: kind alternation, the draft/submitted state
//! machine, and the post-submission edit window.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::access::{Actor, InspectionScope, Scope};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Minutes after creation during which a submitted inspection stays editable.
pub const DEFAULT_EDIT_WINDOW_MINS: i64 = 30;

pub const KIND_PRE_TRIP: &str = "pre-trip";
pub const KIND_POST_TRIP: &str = "post-trip";

// ---------------------------------------------------------------------------
// Inspection kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionKind {
    #[serde(rename = "pre-trip")]
    PreTrip,
    #[serde(rename = "post-trip")]
    PostTrip,
}

impl InspectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionKind::PreTrip => KIND_PRE_TRIP,
            InspectionKind::PostTrip => KIND_POST_TRIP,
        }
    }
}

impl fmt::Display for InspectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KIND_PRE_TRIP => Ok(InspectionKind::PreTrip),
            KIND_POST_TRIP => Ok(InspectionKind::PostTrip),
            other => Err(CoreError::Validation(format!(
                "Invalid inspection type '{other}'. Must be one of: pre-trip, post-trip"
            ))),
        }
    }
}

/// Pick the kind of a new inspection from the most recent completed one.
///
/// No history starts a pre-trip; a pre-trip is followed by a post-trip;
/// anything else starts a new pre-trip.
pub fn next_kind(last_completed: Option<InspectionKind>) -> InspectionKind {
    match last_completed {
        Some(InspectionKind::PreTrip) => InspectionKind::PostTrip,
        Some(InspectionKind::PostTrip) | None => InspectionKind::PreTrip,
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Editability {
    Editable,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "editability", rename_all = "snake_case")]
pub enum Stage {
    Draft,
    Submitted(Editability),
}

/// Policy knobs for post-submission edits.
#[derive(Debug, Clone, Copy)]
pub struct EditPolicy {
    pub window: Duration,
    /// Let organization admins edit inspections whose window has closed.
    pub admin_overrides_window: bool,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(DEFAULT_EDIT_WINDOW_MINS),
            admin_overrides_window: false,
        }
    }
}

impl EditPolicy {
    pub fn is_open(&self, created_at: Timestamp, now: Timestamp) -> bool {
        now.signed_duration_since(created_at) <= self.window
    }

    pub fn stage(&self, is_draft: bool, created_at: Timestamp, now: Timestamp) -> Stage {
        if is_draft {
            Stage::Draft
        } else if self.is_open(created_at, now) {
            Stage::Submitted(Editability::Editable)
        } else {
            Stage::Submitted(Editability::Locked)
        }
    }
}

/// Decide whether `actor` may apply an update to a submitted inspection.
///
/// The owning driver may edit while the window is open. An admin of the
/// inspection's organization has the same right, and may also edit locked
/// inspections when the policy allows it.
pub fn authorize_edit(
    actor: &Actor,
    target: &InspectionScope,
    stage: Stage,
    policy: &EditPolicy,
) -> Result<(), CoreError> {
    let editability = match stage {
        Stage::Draft => {
            return Err(CoreError::Validation(
                "Draft inspections are completed via submit, not edited".into(),
            ))
        }
        Stage::Submitted(e) => e,
    };

    let is_owner = target.owner.is_driver(actor.id);
    let is_org_admin = actor.role.is_admin()
        && matches!(actor.scope, Scope::Org(_))
        && actor.scope == target.scope;

    if !is_owner && !is_org_admin {
        return Err(CoreError::Forbidden(
            "Only the inspecting driver can edit this inspection".into(),
        ));
    }

    match editability {
        Editability::Editable => Ok(()),
        Editability::Locked if is_org_admin && policy.admin_overrides_window => Ok(()),
        Editability::Locked => Err(CoreError::Forbidden(format!(
            "Inspections can only be edited within {} minutes of creation",
            policy.window.num_minutes()
        ))),
    }
}

/// Only drivers start and submit inspections. `action` names the attempted
/// operation for the error message.
pub fn require_driver(actor: &Actor, action: &str) -> Result<(), CoreError> {
    if actor.role == Role::Driver {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("Only drivers can {action} inspections")))
    }
}

/// A template or vehicle owned by an organization may only be used by that
/// organization's drivers. Resources without an organization are shared.
pub fn authorize_org_resource(
    actor: &Actor,
    resource_org_id: Option<DbId>,
    entity: &str,
) -> Result<(), CoreError> {
    match resource_org_id {
        None => Ok(()),
        Some(org_id) if actor.scope == Scope::Org(org_id) => Ok(()),
        Some(_) => Err(CoreError::Forbidden(format!(
            "{entity} belongs to a different organization"
        ))),
    }
}
