//! Business logic services

pub mod auth;
pub mod equipment;
pub mod ids;
pub mod notifications;
pub mod requests;
pub mod stats;
pub mod sync;

use chrono::FixedOffset;

use crate::{config::AuthConfig, store::SharedStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub equipment: equipment::EquipmentService,
    pub requests: requests::RepairRequestService,
    pub stats: stats::StatsService,
    store: SharedStore,
}

impl Services {
    /// Create all services over one shared store. Mutations are reconciled
    /// through `sync`; `offset` is the local time zone of the dashboards.
    pub fn new(store: SharedStore, sync: sync::SyncQueue, auth_config: AuthConfig, offset: FixedOffset) -> Self {
        Self {
            auth: auth::AuthService::new(store.clone(), auth_config),
            equipment: equipment::EquipmentService::new(store.clone(), sync.clone(), offset),
            requests: requests::RepairRequestService::new(store.clone(), sync, offset),
            stats: stats::StatsService::new(store.clone(), offset),
            store,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
