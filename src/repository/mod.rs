//! Persistence layer
//!
//! The durable store is row oriented with snake_case columns. Each entity has
//! a row struct mirroring its table and an explicit conversion to the domain
//! model; nothing outside this module sees a row.

pub mod clinics;
pub mod equipment;
pub mod repair_requests;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Equipment, RepairRequest},
    store::EntityStore,
};

/// Durable store the in-memory session is reconciled with
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load every entity; requests newest first
    async fn load_snapshot(&self) -> AppResult<EntityStore>;

    async fn insert_request(&self, request: &RepairRequest) -> AppResult<()>;

    /// Overwrites every mutable column (last write wins)
    async fn update_request(&self, request: &RepairRequest) -> AppResult<()>;

    async fn insert_equipment(&self, equipment: &Equipment) -> AppResult<()>;

    async fn update_equipment(&self, equipment: &Equipment) -> AppResult<()>;

    async fn delete_equipment(&self, id: &str) -> AppResult<()>;
}

/// Postgres-backed repository
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Persistence for Repository {
    async fn load_snapshot(&self) -> AppResult<EntityStore> {
        let clinics = self.clinics_list().await?;
        let users = self.users_list().await?;
        let equipment = self.equipment_list().await?;
        let requests = self.repair_requests_list().await?;
        tracing::info!(
            clinics = clinics.len(),
            users = users.len(),
            equipment = equipment.len(),
            requests = requests.len(),
            "Loaded snapshot from database"
        );
        Ok(EntityStore::new(clinics, users, equipment, requests))
    }

    async fn insert_request(&self, request: &RepairRequest) -> AppResult<()> {
        self.repair_requests_insert(request).await
    }

    async fn update_request(&self, request: &RepairRequest) -> AppResult<()> {
        self.repair_requests_update(request).await
    }

    async fn insert_equipment(&self, equipment: &Equipment) -> AppResult<()> {
        self.equipment_insert(equipment).await
    }

    async fn update_equipment(&self, equipment: &Equipment) -> AppResult<()> {
        self.equipment_update(equipment).await
    }

    async fn delete_equipment(&self, id: &str) -> AppResult<()> {
        self.equipment_delete(id).await
    }
}

/// Persistence for sessions without a database: nothing is stored
#[derive(Debug, Clone, Default)]
pub struct NoopPersistence;

#[async_trait]
impl Persistence for NoopPersistence {
    async fn load_snapshot(&self) -> AppResult<EntityStore> {
        Ok(crate::store::seed::demo_store())
    }

    async fn insert_request(&self, request: &RepairRequest) -> AppResult<()> {
        tracing::debug!(id = %request.id, "No database, request kept in memory only");
        Ok(())
    }

    async fn update_request(&self, request: &RepairRequest) -> AppResult<()> {
        tracing::debug!(id = %request.id, "No database, request kept in memory only");
        Ok(())
    }

    async fn insert_equipment(&self, equipment: &Equipment) -> AppResult<()> {
        tracing::debug!(id = %equipment.id, "No database, equipment kept in memory only");
        Ok(())
    }

    async fn update_equipment(&self, equipment: &Equipment) -> AppResult<()> {
        tracing::debug!(id = %equipment.id, "No database, equipment kept in memory only");
        Ok(())
    }

    async fn delete_equipment(&self, id: &str) -> AppResult<()> {
        tracing::debug!(id, "No database, equipment removed from memory only");
        Ok(())
    }
}
