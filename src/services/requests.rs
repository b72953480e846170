//! Repair request lifecycle
//!
//! Enforces the request state machine, keeps the owning equipment's status
//! in step with the request, and queues persistence and notifications for
//! every successful change. Each operation holds the store write lock from
//! its first read to its last write.

use chrono::{FixedOffset, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        repair_request::{CompleteRepair, CreateRepairRequest, RepairRequestDetails, RequestQuery, SetEstimate},
        Actor, Equipment, EquipmentStatus, RepairRequest, RepairStatus, Role,
    },
    services::{
        ids,
        notifications::{new_request_alert, status_changed_alert},
        stats::DateRange,
        sync::{PersistOp, SyncJob, SyncQueue},
    },
    store::{EntityStore, SharedStore},
};

#[derive(Clone)]
pub struct RepairRequestService {
    store: SharedStore,
    sync: SyncQueue,
    offset: FixedOffset,
}

impl RepairRequestService {
    pub fn new(store: SharedStore, sync: SyncQueue, offset: FixedOffset) -> Self {
        Self { store, sync, offset }
    }

    /// Report broken equipment. The request starts as `New`.
    pub async fn create(&self, actor: &Actor, data: CreateRepairRequest) -> AppResult<RepairRequest> {
        data.validate()?;
        if data.issue_description.trim().is_empty() {
            return Err(AppError::Validation("Issue description is required".to_string()));
        }
        if data.estimated_cost.is_some_and(|cost| cost < Decimal::ZERO) {
            return Err(AppError::Validation("Estimated cost cannot be negative".to_string()));
        }

        let clinic_id = match (actor.scoped_clinic(), data.clinic_id) {
            (Some(own), Some(requested)) if requested != own => {
                return Err(AppError::Authorization(format!(
                    "{} cannot report for clinic {}",
                    actor.username, requested
                )));
            }
            (Some(own), _) => own.to_string(),
            (None, Some(requested)) => requested,
            (None, None) => return Err(AppError::Validation("Clinic is required".to_string())),
        };

        let mut store = self.store.write().await;
        if store.clinic(&clinic_id).is_none() {
            return Err(AppError::Validation(format!("Unknown clinic {}", clinic_id)));
        }
        let equipment = store
            .equipment_by_id(&data.equipment_id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", data.equipment_id)))?;
        if equipment.clinic_id != clinic_id {
            return Err(AppError::Validation(format!(
                "Equipment {} does not belong to clinic {}",
                equipment.id, clinic_id
            )));
        }

        let mut id = ids::request_id();
        while store.request(&id).is_some() {
            id = ids::request_id();
        }

        let request = RepairRequest {
            id,
            create_date: Utc::now(),
            requester_username: actor.username.clone(),
            clinic_id,
            equipment_id: equipment.id.clone(),
            equipment_name: equipment.name.clone(),
            issue_description: data.issue_description.trim().to_string(),
            images_before: data.images_before,
            status: RepairStatus::New,
            approver_username: None,
            estimated_cost: data.estimated_cost,
            repair_cost: None,
            warranty_months: None,
            completion_date: None,
            technician_notes: None,
            images_after: Vec::new(),
        };
        store.insert_request(request.clone());
        drop(store);

        tracing::info!(
            id = %request.id,
            clinic = %request.clinic_id,
            equipment = %request.equipment_id,
            "Repair request created by {}",
            actor.username
        );
        self.sync.enqueue(
            SyncJob::new(vec![PersistOp::InsertRequest(request.clone())])
                .with_notification(new_request_alert(&request)),
        );
        Ok(request)
    }

    /// Admin approval: the equipment goes into maintenance
    pub async fn approve(&self, actor: &Actor, id: &str) -> AppResult<RepairRequest> {
        actor.require_role(&[Role::Admin], "approve repair requests")?;
        let approver = actor.username.clone();
        self.transition(actor, id, RepairStatus::Approved, "approve", |_, _| Ok(()), |request| {
            request.approver_username = Some(approver);
        })
        .await
    }

    /// Admin rejection; terminal and leaves the equipment alone
    pub async fn reject(&self, actor: &Actor, id: &str) -> AppResult<RepairRequest> {
        actor.require_role(&[Role::Admin], "reject repair requests")?;
        let approver = actor.username.clone();
        self.transition(actor, id, RepairStatus::Rejected, "reject", |_, _| Ok(()), |request| {
            request.approver_username = Some(approver);
        })
        .await
    }

    /// Optional step between approval and completion
    pub async fn begin_work(&self, actor: &Actor, id: &str) -> AppResult<RepairRequest> {
        actor.require_role(&[Role::Admin, Role::Technician], "start repairs")?;
        self.transition(actor, id, RepairStatus::InProgress, "start", |_, _| Ok(()), |_| {})
            .await
    }

    /// Record the repair outcome. On an already completed request this
    /// corrects cost, warranty and notes but keeps the completion date.
    pub async fn complete(&self, actor: &Actor, id: &str, data: CompleteRepair) -> AppResult<RepairRequest> {
        if data.repair_cost < Decimal::ZERO {
            return Err(AppError::Validation("Repair cost cannot be negative".to_string()));
        }
        if data.warranty_months < 0 {
            return Err(AppError::Validation("Warranty months cannot be negative".to_string()));
        }

        let authorize = |actor: &Actor, request: &RepairRequest| {
            if matches!(actor.role, Role::Admin | Role::Technician) || actor.is_staff_of(&request.clinic_id) {
                Ok(())
            } else {
                Err(AppError::Authorization(format!(
                    "{} cannot complete requests of clinic {}",
                    actor.username, request.clinic_id
                )))
            }
        };
        self.transition(actor, id, RepairStatus::Completed, "complete", authorize, |request| {
            request.repair_cost = Some(data.repair_cost);
            request.warranty_months = Some(data.warranty_months);
            if data.technician_notes.is_some() {
                request.technician_notes = data.technician_notes;
            }
            if let Some(images) = data.images_after {
                request.images_after = images;
            }
            request.completion_date.get_or_insert_with(Utc::now);
        })
        .await
    }

    /// Informational estimate; allowed until the request is completed
    pub async fn set_estimate(&self, actor: &Actor, id: &str, data: SetEstimate) -> AppResult<RepairRequest> {
        actor.require_role(&[Role::Admin, Role::Technician], "estimate repairs")?;
        if data.estimated_cost < Decimal::ZERO {
            return Err(AppError::Validation("Estimated cost cannot be negative".to_string()));
        }

        let mut store = self.store.write().await;
        let request = find_request_mut(&mut store, id)?;
        if request.status == RepairStatus::Completed {
            return Err(AppError::InvalidTransition {
                id: id.to_string(),
                from: request.status.to_string(),
                action: "estimate".to_string(),
            });
        }
        request.estimated_cost = Some(data.estimated_cost);
        let updated = request.clone();
        drop(store);

        tracing::info!(id, cost = %data.estimated_cost, "Estimate set by {}", actor.username);
        self.sync
            .enqueue(SyncJob::new(vec![PersistOp::UpdateRequest(updated.clone())]));
        Ok(updated)
    }

    /// Request with its equipment resolved (the equipment may be gone)
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<RepairRequestDetails> {
        let store = self.store.read().await;
        let request = store
            .request(id)
            .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))?;
        ensure_visible(actor, request)?;
        Ok(RepairRequestDetails::new(
            request.clone(),
            store.equipment_by_id(&request.equipment_id).cloned(),
            store.clinic(&request.clinic_id).map(|c| c.name.clone()),
        ))
    }

    /// Requests matching the filters, newest first. Clinic staff only see
    /// their own clinic.
    pub async fn list(&self, actor: &Actor, query: &RequestQuery) -> AppResult<Vec<RepairRequest>> {
        let clinic_filter = actor.scoped_clinic().or(query.clinic_id.as_deref());
        let range = DateRange::new(query.from, query.to);
        let text = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

        let store = self.store.read().await;
        Ok(store
            .requests()
            .iter()
            .filter(|r| clinic_filter.map_or(true, |c| r.clinic_id == c))
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .filter(|r| text.map_or(true, |t| r.matches_text(t)))
            .filter(|r| {
                let date = r.create_date.with_timezone(&self.offset).date_naive();
                range.contains(date).unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    /// Shared status change: lookup, authorization, state check, mutation,
    /// equipment side effect, then queueing.
    async fn transition<A, F>(
        &self,
        actor: &Actor,
        id: &str,
        target: RepairStatus,
        action: &str,
        authorize: A,
        update: F,
    ) -> AppResult<RepairRequest>
    where
        A: FnOnce(&Actor, &RepairRequest) -> AppResult<()>,
        F: FnOnce(&mut RepairRequest),
    {
        let mut store = self.store.write().await;
        let request = find_request_mut(&mut store, id)?;
        authorize(actor, &*request)?;

        let from = request.status;
        if !from.can_transition_to(target) {
            return Err(AppError::InvalidTransition {
                id: id.to_string(),
                from: from.to_string(),
                action: action.to_string(),
            });
        }
        update(&mut *request);
        request.status = target;
        let updated = request.clone();

        let mut ops = vec![PersistOp::UpdateRequest(updated.clone())];
        if let Some(effect) = target.equipment_effect() {
            if let Some(equipment) = set_equipment_status(&mut store, &updated.equipment_id, effect) {
                ops.push(PersistOp::UpdateEquipment(equipment));
            }
        }
        drop(store);

        tracing::info!(id, from = %from, to = %target, "Repair request updated by {}", actor.username);
        let mut job = SyncJob::new(ops);
        if from != target {
            job = job.with_notification(status_changed_alert(&updated));
        }
        self.sync.enqueue(job);
        Ok(updated)
    }
}

fn find_request_mut<'a>(store: &'a mut EntityStore, id: &str) -> AppResult<&'a mut RepairRequest> {
    store
        .request_mut(id)
        .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))
}

fn ensure_visible(actor: &Actor, request: &RepairRequest) -> AppResult<()> {
    match actor.scoped_clinic() {
        Some(own) if own != request.clinic_id => Err(AppError::Authorization(format!(
            "Request {} belongs to another clinic",
            request.id
        ))),
        _ => Ok(()),
    }
}

/// Returns the equipment when its status actually changed
fn set_equipment_status(
    store: &mut EntityStore,
    equipment_id: &str,
    status: EquipmentStatus,
) -> Option<Equipment> {
    let Some(equipment) = store.equipment_by_id_mut(equipment_id) else {
        tracing::warn!(equipment_id, "Equipment no longer listed, status not updated");
        return None;
    };
    if equipment.status == status {
        return None;
    }
    equipment.status = status;
    Some(equipment.clone())
}
