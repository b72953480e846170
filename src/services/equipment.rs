//! Equipment registry

use chrono::{FixedOffset, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{CreateEquipment, EquipmentQuery, UpdateEquipment},
        Actor, Equipment, Role,
    },
    services::{
        ids,
        sync::{PersistOp, SyncJob, SyncQueue},
    },
    store::SharedStore,
};

#[derive(Clone)]
pub struct EquipmentService {
    store: SharedStore,
    sync: SyncQueue,
    offset: FixedOffset,
}

impl EquipmentService {
    pub fn new(store: SharedStore, sync: SyncQueue, offset: FixedOffset) -> Self {
        Self { store, sync, offset }
    }

    pub async fn list(&self, actor: &Actor, query: &EquipmentQuery) -> AppResult<Vec<Equipment>> {
        let clinic_filter = actor.scoped_clinic().or(query.clinic_id.as_deref());
        let store = self.store.read().await;
        Ok(store
            .equipment()
            .iter()
            .filter(|e| clinic_filter.map_or(true, |c| e.clinic_id == c))
            .filter(|e| query.status.map_or(true, |s| e.status == s))
            .cloned()
            .collect())
    }

    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<Equipment> {
        let store = self.store.read().await;
        let equipment = store
            .equipment_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        ensure_owner(actor, equipment)?;
        Ok(equipment.clone())
    }

    /// Register equipment. Clinic staff always register into their own clinic.
    pub async fn add(&self, actor: &Actor, data: CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Equipment name is required".to_string()));
        }

        let clinic_id = match actor.scoped_clinic() {
            Some(own) => own.to_string(),
            None => data
                .clinic_id
                .ok_or_else(|| AppError::Validation("Clinic is required".to_string()))?,
        };

        let mut store = self.store.write().await;
        if store.clinic(&clinic_id).is_none() {
            return Err(AppError::Validation(format!("Unknown clinic {}", clinic_id)));
        }

        let mut id = ids::equipment_id(&clinic_id);
        while store.equipment_by_id(&id).is_some() {
            id = ids::equipment_id(&clinic_id);
        }
        let equipment = Equipment {
            id,
            clinic_id,
            name: name.to_string(),
            model: data.model,
            serial_number: data.serial_number,
            install_date: data
                .install_date
                .unwrap_or_else(|| Utc::now().with_timezone(&self.offset).date_naive()),
            status: data.status.unwrap_or_default(),
        };
        store.insert_equipment(equipment.clone());
        drop(store);

        tracing::info!(id = %equipment.id, clinic = %equipment.clinic_id, "Equipment added by {}", actor.username);
        self.sync
            .enqueue(SyncJob::new(vec![PersistOp::InsertEquipment(equipment.clone())]));
        Ok(equipment)
    }

    /// Edit descriptive fields or set the status by hand
    pub async fn update(&self, actor: &Actor, id: &str, data: UpdateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Equipment name cannot be empty".to_string()));
        }

        let mut store = self.store.write().await;
        let equipment = store
            .equipment_by_id_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        ensure_owner(actor, equipment)?;
        data.apply(equipment);
        let updated = equipment.clone();
        drop(store);

        tracing::info!(id, status = %updated.status, "Equipment updated by {}", actor.username);
        self.sync
            .enqueue(SyncJob::new(vec![PersistOp::UpdateEquipment(updated.clone())]));
        Ok(updated)
    }

    /// Hard delete. Repair requests keep their equipment id and name snapshot.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        let mut store = self.store.write().await;
        let equipment = store
            .equipment_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        ensure_owner(actor, equipment)?;
        store.remove_equipment(id);
        drop(store);

        tracing::info!(id, "Equipment deleted by {}", actor.username);
        self.sync
            .enqueue(SyncJob::new(vec![PersistOp::DeleteEquipment(id.to_string())]));
        Ok(())
    }
}

fn ensure_owner(actor: &Actor, equipment: &Equipment) -> AppResult<()> {
    if actor.role == Role::Clinic && !actor.is_staff_of(&equipment.clinic_id) {
        return Err(AppError::Authorization(format!(
            "Equipment {} belongs to another clinic",
            equipment.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Clinic, EquipmentStatus, User},
        services::sync::SyncJob,
        store::EntityStore,
    };
    use chrono::NaiveDate;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn actor(username: &str, role: Role, clinic_id: Option<&str>) -> Actor {
        User {
            username: username.to_string(),
            full_name: username.to_string(),
            role,
            clinic_id: clinic_id.map(str::to_string),
        }
        .actor()
    }

    fn setup() -> (EquipmentService, SharedStore, UnboundedReceiver<SyncJob>) {
        let clinics = ["CN_GODEN", "CN_SG1"]
            .into_iter()
            .map(|id| Clinic { id: id.to_string(), name: id.to_string(), address: None })
            .collect();
        let store = EntityStore::new(clinics, vec![], vec![], vec![]).into_shared();
        let (queue, rx) = SyncQueue::channel();
        let service = EquipmentService::new(store.clone(), queue, FixedOffset::east_opt(7 * 3600).unwrap());
        (service, store, rx)
    }

    fn chair() -> CreateEquipment {
        CreateEquipment {
            clinic_id: None,
            name: " Dental chair ".to_string(),
            model: "K3".to_string(),
            serial_number: "SN-1".to_string(),
            install_date: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_add_uses_clinic_code_and_defaults() {
        let (service, _store, mut rx) = setup();
        let staff = actor("cn_goden", Role::Clinic, Some("CN_GODEN"));
        let mut data = chair();
        data.clinic_id = Some("CN_SG1".to_string());

        let equipment = service.add(&staff, data).await.unwrap();
        assert!(equipment.id.starts_with("EQ_GODEN_"));
        assert_eq!(equipment.clinic_id, "CN_GODEN");
        assert_eq!(equipment.name, "Dental chair");
        assert_eq!(equipment.status, EquipmentStatus::Active);

        let job = rx.try_recv().unwrap();
        assert!(matches!(job.ops[0], PersistOp::InsertEquipment(ref e) if e.id == equipment.id));
        assert!(job.notification.is_none());
    }

    #[tokio::test]
    async fn test_add_requires_known_clinic() {
        let (service, _store, _rx) = setup();
        let admin = actor("admin", Role::Admin, None);
        assert!(matches!(service.add(&admin, chair()).await, Err(AppError::Validation(_))));

        let mut data = chair();
        data.clinic_id = Some("CN_NOWHERE".to_string());
        assert!(matches!(service.add(&admin, data).await, Err(AppError::Validation(_))));

        let mut data = chair();
        data.clinic_id = Some("CN_SG1".to_string());
        data.name = "  ".to_string();
        assert!(matches!(service.add(&admin, data).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_respect_ownership() {
        let (service, store, mut rx) = setup();
        let admin = actor("admin", Role::Admin, None);
        let mut data = chair();
        data.clinic_id = Some("CN_SG1".to_string());
        data.install_date = NaiveDate::from_ymd_opt(2022, 6, 1);
        let equipment = service.add(&admin, data).await.unwrap();

        let outsider = actor("cn_goden", Role::Clinic, Some("CN_GODEN"));
        let change = UpdateEquipment {
            status: Some(EquipmentStatus::Disposed),
            ..UpdateEquipment::default()
        };
        assert!(matches!(
            service.update(&outsider, &equipment.id, change.clone()).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            service.delete(&outsider, &equipment.id).await,
            Err(AppError::Authorization(_))
        ));

        let owner = actor("cn_sg1", Role::Clinic, Some("CN_SG1"));
        let updated = service.update(&owner, &equipment.id, change).await.unwrap();
        assert_eq!(updated.status, EquipmentStatus::Disposed);
        assert_eq!(updated.install_date, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());

        service.delete(&owner, &equipment.id).await.unwrap();
        assert!(store.read().await.equipment_by_id(&equipment.id).is_none());
        assert!(matches!(
            service.get(&admin, &equipment.id).await,
            Err(AppError::NotFound(_))
        ));

        let ops: Vec<PersistOp> = std::iter::from_fn(|| rx.try_recv().ok())
            .flat_map(|job| job.ops)
            .collect();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2], PersistOp::DeleteEquipment(equipment.id.clone()));
    }

    #[tokio::test]
    async fn test_list_is_scoped_for_clinic_staff() {
        let (service, _store, _rx) = setup();
        let admin = actor("admin", Role::Admin, None);
        for clinic in ["CN_GODEN", "CN_SG1", "CN_SG1"] {
            let mut data = chair();
            data.clinic_id = Some(clinic.to_string());
            service.add(&admin, data).await.unwrap();
        }

        let staff = actor("cn_goden", Role::Clinic, Some("CN_GODEN"));
        let query = EquipmentQuery {
            clinic_id: Some("CN_SG1".to_string()),
            status: None,
        };
        assert_eq!(service.list(&staff, &query).await.unwrap().len(), 1);
        assert_eq!(service.list(&admin, &query).await.unwrap().len(), 2);
        assert_eq!(service.list(&admin, &EquipmentQuery::default()).await.unwrap().len(), 3);
    }
}
