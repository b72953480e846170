//! In-memory entity store
//!
//! The authoritative collection of clinics, users, equipment and repair
//! requests for the running session. Every mutation goes through the
//! lifecycle and registry services, which hold the write lock for the whole
//! read-modify-write so operations on one entity never interleave.
//! Requests are kept newest first, the order the persistence layer returns.

pub mod seed;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Clinic, Equipment, RepairRequest, User};

pub type SharedStore = Arc<RwLock<EntityStore>>;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    clinics: Vec<Clinic>,
    users: Vec<User>,
    equipment: Vec<Equipment>,
    requests: Vec<RepairRequest>,
}

impl EntityStore {
    /// Build a store from already loaded collections.
    /// `requests` must be ordered by creation date, newest first.
    pub fn new(
        clinics: Vec<Clinic>,
        users: Vec<User>,
        equipment: Vec<Equipment>,
        requests: Vec<RepairRequest>,
    ) -> Self {
        Self {
            clinics,
            users,
            equipment,
            requests,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // Clinics

    pub fn clinics(&self) -> &[Clinic] {
        &self.clinics
    }

    pub fn clinic(&self, id: &str) -> Option<&Clinic> {
        self.clinics.iter().find(|c| c.id == id)
    }

    // Users

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    // Equipment

    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    pub fn equipment_by_id(&self, id: &str) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id == id)
    }

    pub fn equipment_by_id_mut(&mut self, id: &str) -> Option<&mut Equipment> {
        self.equipment.iter_mut().find(|e| e.id == id)
    }

    pub fn clinic_equipment<'a>(&'a self, clinic_id: &'a str) -> impl Iterator<Item = &'a Equipment> + 'a {
        self.equipment.iter().filter(move |e| e.clinic_id == clinic_id)
    }

    pub fn insert_equipment(&mut self, equipment: Equipment) {
        self.equipment.push(equipment);
    }

    /// Hard delete. Requests referencing the equipment are left untouched.
    pub fn remove_equipment(&mut self, id: &str) -> Option<Equipment> {
        let index = self.equipment.iter().position(|e| e.id == id)?;
        Some(self.equipment.remove(index))
    }

    // Repair requests

    pub fn requests(&self) -> &[RepairRequest] {
        &self.requests
    }

    pub fn request(&self, id: &str) -> Option<&RepairRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn request_mut(&mut self, id: &str) -> Option<&mut RepairRequest> {
        self.requests.iter_mut().find(|r| r.id == id)
    }

    /// New requests go to the front to keep newest-first ordering
    pub fn insert_request(&mut self, request: RepairRequest) {
        self.requests.insert(0, request);
    }
}
