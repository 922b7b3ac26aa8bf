//! Visibility rules for inspections.
//!
//! A caller's [`Actor`] is reduced to a [`ScopeFilter`], which is the single
//! source of truth for both single-record checks ([`can_access`]) and bulk
//! queries (the `db` crate renders the same filter into a `WHERE` clause).
//!
//! Nullable foreign keys on an inspection are lifted into explicit tagged
//! states here ([`Owner`] and [`Scope`]) so callers never reason about raw
//! `Option<DbId>` columns.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Who an inspection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "driver_id", rename_all = "snake_case")]
pub enum Owner {
    Driver(DbId),
    /// No driver attached (never assigned, or the driver was deleted).
    Unassigned,
}

impl Owner {
    pub fn from_column(driver_id: Option<DbId>) -> Self {
        driver_id.map_or(Owner::Unassigned, Owner::Driver)
    }

    pub fn is_driver(self, id: DbId) -> bool {
        self == Owner::Driver(id)
    }
}

/// Organization scope of an actor or an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "org_id", rename_all = "snake_case")]
pub enum Scope {
    Org(DbId),
    /// Not affiliated with any organization.
    Personal,
}

impl Scope {
    pub fn from_column(org_id: Option<DbId>) -> Self {
        org_id.map_or(Scope::Personal, Scope::Org)
    }

    pub fn org_id(self) -> Option<DbId> {
        match self {
            Scope::Org(id) => Some(id),
            Scope::Personal => None,
        }
    }
}

/// An authenticated caller together with their current organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
    pub scope: Scope,
}

impl Actor {
    pub fn new(id: DbId, role: Role, org_id: Option<DbId>) -> Self {
        Self {
            id,
            role,
            scope: Scope::from_column(org_id),
        }
    }
}

/// The access-relevant attributes of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionScope {
    pub owner: Owner,
    pub scope: Scope,
}

impl InspectionScope {
    pub fn from_columns(driver_id: Option<DbId>, org_id: Option<DbId>) -> Self {
        Self {
            owner: Owner::from_column(driver_id),
            scope: Scope::from_column(org_id),
        }
    }
}

/// The set of inspections visible to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Every inspection in the organization (admins).
    Organization { org_id: DbId },
    /// The driver's own inspections plus unassigned ones in their organization.
    DriverInOrganization { driver_id: DbId, org_id: DbId },
    /// Only inspections the actor authored.
    OwnOnly { driver_id: DbId },
}

impl ScopeFilter {
    pub fn matches(&self, target: &InspectionScope) -> bool {
        match *self {
            ScopeFilter::Organization { org_id } => target.scope == Scope::Org(org_id),
            ScopeFilter::DriverInOrganization { driver_id, org_id } => {
                target.owner.is_driver(driver_id)
                    || (target.owner == Owner::Unassigned && target.scope == Scope::Org(org_id))
            }
            ScopeFilter::OwnOnly { driver_id } => target.owner.is_driver(driver_id),
        }
    }
}

/// Reduce an actor to the filter describing everything they may read.
///
/// An admin without an organization has nothing to administer and falls back
/// to their own records.
pub fn scoped_filter(actor: &Actor) -> ScopeFilter {
    match (actor.role, actor.scope) {
        (Role::Admin, Scope::Org(org_id)) => ScopeFilter::Organization { org_id },
        (Role::Driver, Scope::Org(org_id)) => ScopeFilter::DriverInOrganization {
            driver_id: actor.id,
            org_id,
        },
        (_, Scope::Personal) => ScopeFilter::OwnOnly {
            driver_id: actor.id,
        },
    }
}

pub fn can_access(actor: &Actor, target: &InspectionScope) -> bool {
    scoped_filter(actor).matches(target)
}

/// Gate a direct single-record read.
pub fn authorize(actor: &Actor, target: &InspectionScope) -> Result<(), CoreError> {
    if can_access(actor, target) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this inspection".into(),
        ))
    }
}
