use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tripcheck_core::access::{authorize, scoped_filter, Actor};
use tripcheck_core::continuity::{self, PriorTrip, Reading};
use tripcheck_core::error::CoreError;
use tripcheck_core::lifecycle::{
    authorize_edit, authorize_org_resource, next_kind, require_driver, InspectionKind,
};
use tripcheck_core::results::validate_results;
use tripcheck_core::types::DbId;
use tripcheck_db::models::inspection::{
    HistoryFilter, Inspection, InspectionView, NewCompleted, NewDraft, PriorReading,
    SubmittedFields, UpdateInspection,
};
use tripcheck_db::models::template::Template;
use tripcheck_db::models::user::{DriverSnapshot, User};
use tripcheck_db::repositories::inspection_repo::parse_kind;
use tripcheck_db::repositories::{InspectionRepo, TemplateRepo, UserRepo, VehicleRepo};
use tripcheck_db::DbPool;
use tripcheck_events::{Notifier, EVENT_INSPECTION_CREATED, EVENT_INSPECTION_UPDATED};
use validator::Validate;

use crate::config::InspectionPolicy;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// The authenticated user together with their access-scoping view.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    pub actor: Actor,
}

impl Caller {
    /// Combine the token's identity pair with the user's current
    /// organization from the user store.
    pub async fn resolve(pool: &DbPool, auth: &AuthUser) -> AppResult<Self> {
        let user = UserRepo::find_by_id(pool, auth.user_id)
            .await?
            .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;
        let actor = Actor::new(auth.user_id, auth.role, user.org_id);
        Ok(Self { user, actor })
    }
}

/// Body of `POST /inspections/start`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartInspection {
    #[validate(range(min = 1))]
    pub vehicle_id: DbId,
    #[validate(range(min = 1))]
    pub template_id: Option<DbId>,
}

/// Body of `POST /inspections/submit`.
///
/// Either names the draft to finalize (`inspection_id`) or carries the
/// `vehicle_id`/`template_id` pair, in which case a matching open draft is
/// finalized if one exists and a new record is created otherwise.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitInspection {
    pub inspection_id: Option<DbId>,
    pub vehicle_id: Option<DbId>,
    pub template_id: Option<DbId>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub results: Option<Value>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub start_mileage: Option<i64>,
    pub fuel_level: Option<f64>,
    #[validate(length(max = 1000))]
    pub fuel_notes: Option<String>,
    #[serde(default)]
    pub odometer_verified: bool,
}

/// Inspection lifecycle operations.
///
/// Transactions that lock more than one row take the vehicle row before
/// any inspection row.
pub struct InspectionService<'a> {
    pool: &'a DbPool,
    policy: InspectionPolicy,
    notifier: &'a Notifier,
}

impl<'a> InspectionService<'a> {
    pub fn new(pool: &'a DbPool, policy: InspectionPolicy, notifier: &'a Notifier) -> Self {
        Self {
            pool,
            policy,
            notifier,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.pool, state.config.policy, &state.notifier)
    }

    // ── Start ────────────────────────────────────────────────────────

    /// Return the caller's open draft for (vehicle, template), creating one
    /// if none exists. Repeated calls return the same record.
    pub async fn start(&self, caller: &Caller, input: &StartInspection) -> AppResult<InspectionView> {
        let actor = &caller.actor;
        require_driver(actor, "start")?;

        let vehicle = VehicleRepo::find_by_id(self.pool, input.vehicle_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Vehicle",
                id: input.vehicle_id,
            })?;
        authorize_org_resource(actor, vehicle.org_id, "Vehicle")?;
        if let Some(template_id) = input.template_id {
            self.load_template(actor, template_id).await?;
        }

        let driver_id = actor.id;
        let org_id = actor.scope.org_id();
        let mut tx = self.pool.begin().await?;

        if let Some(existing) =
            InspectionRepo::find_open_draft(&mut *tx, driver_id, vehicle.id, input.template_id)
                .await?
        {
            tx.commit().await?;
            tracing::debug!(inspection_id = existing.id, driver_id, "Resuming open draft");
            return self.view(existing, Vec::new()).await;
        }

        let last_kind = parse_kind(
            InspectionRepo::last_completed_kind(&mut *tx, driver_id, vehicle.id, org_id).await?,
        );
        let draft = NewDraft {
            driver_id,
            vehicle_id: vehicle.id,
            template_id: input.template_id,
            org_id,
            kind: next_kind(last_kind),
            snapshot: DriverSnapshot::from(&caller.user),
        };

        let inspection = match InspectionRepo::insert_draft(&mut *tx, &draft).await? {
            Some(row) => row,
            // A concurrent start committed first; hand back its draft.
            None => InspectionRepo::find_open_draft(
                &mut *tx,
                driver_id,
                vehicle.id,
                input.template_id,
            )
            .await?
            .ok_or_else(|| CoreError::Internal("Open draft disappeared after insert conflict".into()))?,
        };
        tx.commit().await?;

        tracing::info!(
            inspection_id = inspection.id,
            driver_id,
            vehicle_id = vehicle.id,
            kind = %draft.kind,
            "Inspection draft started"
        );
        self.view(inspection, Vec::new()).await
    }

    // ── Submit ───────────────────────────────────────────────────────

    /// Finalize a draft, or create a completed inspection directly.
    ///
    /// Validation runs against the row-locked vehicle before anything is
    /// written. On success the vehicle mileage is advanced, the caller's
    /// other drafts for the vehicle are removed, and `inspection_created` is
    /// published to the inspection's organization. A named draft that a
    /// concurrent submission already finalized or removed is a conflict.
    pub async fn submit(&self, caller: &Caller, input: &SubmitInspection) -> AppResult<InspectionView> {
        let actor = &caller.actor;
        require_driver(actor, "submit")?;
        input.validate()?;
        validate_results(input.results.as_ref())?;
        let requested_kind = input
            .kind
            .as_deref()
            .map(str::parse::<InspectionKind>)
            .transpose()?;

        // An explicitly named draft is read without a lock first: the vehicle
        // row must be locked before any inspection row.
        let named = match input.inspection_id {
            Some(id) => {
                let row = InspectionRepo::find_by_id(self.pool, id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "Inspection",
                        id,
                    })?;
                check_submittable(&row, actor)?;
                Some(row)
            }
            None => None,
        };
        let vehicle_id = reconcile(
            named.as_ref().and_then(|d| d.vehicle_id),
            input.vehicle_id,
            "vehicle_id",
        )?;

        let mut tx = self.pool.begin().await?;

        let vehicle = VehicleRepo::lock_by_id(&mut *tx, vehicle_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Vehicle",
                id: vehicle_id,
            })?;
        authorize_org_resource(actor, vehicle.org_id, "Vehicle")?;

        let draft = match &named {
            Some(named) => {
                // A concurrent submission for this driver and vehicle may have
                // finalized this draft or removed it as stale.
                let row = InspectionRepo::lock_by_id(&mut *tx, named.id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::Conflict(format!(
                            "Inspection {} was superseded by another submission",
                            named.id
                        ))
                    })?;
                check_submittable(&row, actor)?;
                reconcile(row.vehicle_id, Some(vehicle_id), "vehicle_id")?;
                Some(row)
            }
            None => match input.template_id {
                Some(template_id) => {
                    match InspectionRepo::find_open_draft(
                        &mut *tx,
                        actor.id,
                        vehicle_id,
                        Some(template_id),
                    )
                    .await?
                    {
                        Some(row) => Some(row),
                        None => {
                            InspectionRepo::find_open_draft(&mut *tx, actor.id, vehicle_id, None)
                                .await?
                        }
                    }
                }
                None => None,
            },
        };

        let template_id = reconcile(
            draft.as_ref().and_then(|d| d.template_id),
            input.template_id,
            "template_id",
        )?;
        let kind = match &draft {
            Some(d) => {
                let kind = d.kind()?;
                if requested_kind.is_some_and(|requested| requested != kind) {
                    return Err(CoreError::Validation(format!(
                        "type does not match the draft, which is a {kind}"
                    ))
                    .into());
                }
                kind
            }
            None => requested_kind
                .ok_or_else(|| CoreError::Validation("type is required".into()))?,
        };

        let template = self.load_template(actor, template_id).await?;

        let prior = InspectionRepo::previous_completed_for_driver(&mut *tx, actor.id, vehicle_id, None)
            .await?
            .as_ref()
            .map(prior_trip)
            .transpose()?;

        let reading = Reading {
            kind,
            start_mileage: input.start_mileage,
            fuel_level: input.fuel_level,
        };
        let report = continuity::validate(
            &reading,
            vehicle.mileage,
            prior.as_ref(),
            &self.policy.mileage,
        )?;

        let fields = SubmittedFields {
            results: input.results.clone().unwrap_or_default(),
            notes: input.notes.clone(),
            start_mileage: report.start_mileage,
            fuel_level: input.fuel_level,
            fuel_notes: input.fuel_notes.clone(),
            odometer_verified: input.odometer_verified,
        };
        let snapshot = DriverSnapshot::from(&caller.user);

        let inspection = match &draft {
            Some(d) => {
                InspectionRepo::finalize(&mut *tx, d.id, vehicle_id, template.id, &fields, &snapshot)
                    .await?
            }
            None => {
                let new = NewCompleted {
                    driver_id: actor.id,
                    vehicle_id,
                    template_id: template.id,
                    org_id: actor.scope.org_id(),
                    kind,
                    snapshot,
                    fields,
                };
                InspectionRepo::insert_completed(&mut *tx, &new).await?
            }
        };

        let mileage = VehicleRepo::advance_mileage(&mut *tx, vehicle_id, report.start_mileage).await?;
        let removed_drafts =
            InspectionRepo::delete_stale_drafts(&mut *tx, actor.id, vehicle_id, inspection.id)
                .await?;
        tx.commit().await?;

        tracing::info!(
            inspection_id = inspection.id,
            driver_id = actor.id,
            vehicle_id,
            kind = %kind,
            from_draft = draft.is_some(),
            removed_drafts,
            vehicle_mileage = ?mileage,
            "Inspection submitted"
        );
        for warning in &report.warnings {
            tracing::warn!(inspection_id = inspection.id, code = warning.code, "{}", warning.message);
        }

        let view = self.view(inspection, report.warnings).await?;
        self.announce(EVENT_INSPECTION_CREATED, actor, &view);
        Ok(view)
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Edit a submitted inspection inside its edit window.
    ///
    /// A changed `start_mileage` is checked against the vehicle's current
    /// mileage and advances it on success. The kind and ownership of an
    /// inspection never change.
    pub async fn update(
        &self,
        caller: &Caller,
        id: DbId,
        input: &UpdateInspection,
    ) -> AppResult<InspectionView> {
        let actor = &caller.actor;
        input.validate()?;
        if let Some(results) = &input.results {
            validate_results(Some(results))?;
        }

        let current = InspectionRepo::find_by_id(self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Inspection",
                id,
            })?;
        let mileage_changed = input
            .start_mileage
            .is_some_and(|m| Some(m) != current.start_mileage);

        let mut tx = self.pool.begin().await?;
        let vehicle = match current.vehicle_id {
            Some(vehicle_id) if mileage_changed => {
                VehicleRepo::lock_by_id(&mut *tx, vehicle_id).await?
            }
            _ => None,
        };
        let row = InspectionRepo::lock_by_id(&mut *tx, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Inspection",
                id,
            })?;

        let stage = self.policy.edit.stage(row.is_draft, row.created_at, Utc::now());
        authorize_edit(actor, &row.access_scope(), stage, &self.policy.edit)?;

        let prior = match (row.driver_id, row.vehicle_id) {
            (Some(driver_id), Some(vehicle_id)) => InspectionRepo::previous_completed_for_driver(
                &mut *tx,
                driver_id,
                vehicle_id,
                row.completed_at.map(|at| (at, row.id)),
            )
            .await?
            .as_ref()
            .map(prior_trip)
            .transpose()?,
            _ => None,
        };

        let reading = Reading {
            kind: row.kind()?,
            start_mileage: input.start_mileage.or(row.start_mileage),
            fuel_level: input.fuel_level.or(row.fuel_level),
        };
        let report = continuity::validate(
            &reading,
            vehicle.as_ref().and_then(|v| v.mileage),
            prior.as_ref(),
            &self.policy.mileage,
        )?;

        let inspection = InspectionRepo::update_fields(&mut *tx, id, input).await?;
        if let Some(vehicle) = &vehicle {
            VehicleRepo::advance_mileage(&mut *tx, vehicle.id, report.start_mileage).await?;
        }
        tx.commit().await?;

        tracing::info!(
            inspection_id = id,
            actor_id = actor.id,
            mileage_changed,
            "Inspection updated"
        );

        let view = self.view(inspection, report.warnings).await?;
        self.announce(EVENT_INSPECTION_UPDATED, actor, &view);
        Ok(view)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get(&self, caller: &Caller, id: DbId) -> AppResult<InspectionView> {
        let row = InspectionRepo::find_by_id(self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Inspection",
                id,
            })?;
        authorize(&caller.actor, &row.access_scope())?;
        self.view(row, Vec::new()).await
    }

    /// Inspections visible to the caller, newest first.
    pub async fn history(
        &self,
        caller: &Caller,
        filter: &HistoryFilter,
    ) -> AppResult<Vec<InspectionView>> {
        let scope = scoped_filter(&caller.actor);
        let rows = InspectionRepo::list_scoped(self.pool, &scope, filter).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let (inspection, prior) = row.into_parts();
                self.present(inspection, Some(prior), Vec::new())
            })
            .collect())
    }

    /// The most recent completed inspection on a vehicle that the caller
    /// may see.
    pub async fn last_for_vehicle(
        &self,
        caller: &Caller,
        vehicle_id: DbId,
    ) -> AppResult<Option<InspectionView>> {
        VehicleRepo::find_by_id(self.pool, vehicle_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Vehicle",
                id: vehicle_id,
            })?;

        let scope = scoped_filter(&caller.actor);
        match InspectionRepo::last_for_vehicle(self.pool, &scope, vehicle_id).await? {
            Some(row) => Ok(Some(self.view(row, Vec::new()).await?)),
            None => Ok(None),
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn load_template(&self, actor: &Actor, template_id: DbId) -> AppResult<Template> {
        let template = TemplateRepo::find_by_id(self.pool, template_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id: template_id,
            })?;
        authorize_org_resource(actor, template.org_id, "Template")?;
        if !template.is_active {
            return Err(
                CoreError::Validation(format!("Template {template_id} is not active")).into(),
            );
        }
        Ok(template)
    }

    /// Attach derived values and the lifecycle stage.
    async fn view(
        &self,
        inspection: Inspection,
        warnings: Vec<continuity::ContinuityWarning>,
    ) -> AppResult<InspectionView> {
        let preceding = match (inspection.vehicle_id, inspection.completed_at) {
            (Some(vehicle_id), Some(completed_at)) => {
                InspectionRepo::preceding_on_vehicle(
                    self.pool,
                    vehicle_id,
                    completed_at,
                    inspection.id,
                )
                .await?
            }
            _ => None,
        };
        Ok(self.present(inspection, preceding.as_ref().map(PriorReading::from), warnings))
    }

    fn present(
        &self,
        inspection: Inspection,
        prior: Option<PriorReading>,
        warnings: Vec<continuity::ContinuityWarning>,
    ) -> InspectionView {
        let stage = self
            .policy
            .edit
            .stage(inspection.is_draft, inspection.created_at, Utc::now());
        InspectionView::compose(inspection, prior, stage).with_warnings(warnings)
    }

    fn announce(&self, event_type: &str, actor: &Actor, view: &InspectionView) {
        let payload = serde_json::to_value(view).unwrap_or_default();
        self.notifier.publish(
            view.inspection.org_id,
            event_type,
            Some(("inspection", view.inspection.id)),
            Some(actor.id),
            payload,
        );
    }
}

/// Only the owning driver submits, and only while the record is a draft.
fn check_submittable(row: &Inspection, actor: &Actor) -> Result<(), CoreError> {
    if !row.owner().is_driver(actor.id) {
        return Err(CoreError::Forbidden(
            "Only the inspecting driver can submit this inspection".into(),
        ));
    }
    if !row.is_draft {
        return Err(CoreError::Validation(format!(
            "Inspection {} has already been submitted",
            row.id
        )));
    }
    Ok(())
}

/// Merge a field stored on a draft with the value sent on submit.
fn reconcile(
    stored: Option<DbId>,
    requested: Option<DbId>,
    field: &str,
) -> Result<DbId, CoreError> {
    match (stored, requested) {
        (Some(stored), Some(requested)) if stored != requested => Err(CoreError::Validation(
            format!("{field} does not match the draft ({stored})"),
        )),
        (Some(id), _) | (None, Some(id)) => Ok(id),
        (None, None) => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

fn prior_trip(row: &Inspection) -> Result<PriorTrip, CoreError> {
    Ok(PriorTrip {
        kind: row.kind()?,
        start_mileage: row.start_mileage,
        fuel_level: row.fuel_level,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn reconcile_prefers_stored_value() {
        assert_eq!(reconcile(Some(4), None, "vehicle_id").unwrap(), 4);
        assert_eq!(reconcile(Some(4), Some(4), "vehicle_id").unwrap(), 4);
        assert_eq!(reconcile(None, Some(9), "template_id").unwrap(), 9);
    }

    #[test]
    fn reconcile_rejects_mismatch_and_absence() {
        assert_matches!(
            reconcile(Some(4), Some(5), "vehicle_id"),
            Err(CoreError::Validation(msg)) if msg.contains("does not match")
        );
        assert_matches!(
            reconcile(None, None, "template_id"),
            Err(CoreError::Validation(msg)) if msg == "template_id is required"
        );
    }

    #[test]
    fn submit_body_uses_type_for_kind() {
        let body: SubmitInspection = serde_json::from_value(serde_json::json!({
            "vehicle_id": 3,
            "template_id": 1,
            "type": "post-trip",
            "results": {"brakes": "ok"},
            "start_mileage": 1200
        }))
        .unwrap();
        assert_eq!(body.kind.as_deref(), Some("post-trip"));
        assert!(!body.odometer_verified);
        assert!(body.validate().is_ok());
    }
}
