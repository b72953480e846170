//! Reference data for sessions running without a database

use chrono::NaiveDate;

use super::EntityStore;
use crate::models::{Clinic, Equipment, EquipmentStatus, Role, User};

const CLINICS: &[(&str, &str)] = &[
    ("CN_BENLUC", "Saigon Dental Ben Luc"),
    ("CN_SG1", "Saigon Dental 1"),
    ("CN_GODEN", "Saigon Dental Thien Tam - Go Den"),
    ("CN_TRITON", "Saigon Dental Thien Tam - Tri Ton"),
];

/// Clinics, one admin, one technician, one staff account per clinic and a
/// few pieces of equipment. No repair requests.
pub fn demo_store() -> EntityStore {
    let clinics: Vec<Clinic> = CLINICS
        .iter()
        .map(|(id, name)| Clinic {
            id: id.to_string(),
            name: name.to_string(),
            address: None,
        })
        .collect();

    let mut users = vec![
        User {
            username: "admin".to_string(),
            full_name: "General Manager".to_string(),
            role: Role::Admin,
            clinic_id: None,
        },
        User {
            username: "technician".to_string(),
            full_name: "Field Technician".to_string(),
            role: Role::Technician,
            clinic_id: None,
        },
    ];
    users.extend(clinics.iter().map(|clinic| User {
        username: clinic.id.to_lowercase(),
        full_name: format!("Manager, {}", clinic.name),
        role: Role::Clinic,
        clinic_id: Some(clinic.id.clone()),
    }));

    let equipment = vec![
        seed_equipment("EQ_BENLUC_001", "CN_BENLUC", "Dental chair K3", "K3-2023", "SN-BL-001", (2023, 1, 15), EquipmentStatus::Active),
        seed_equipment("EQ_GODEN_001", "CN_GODEN", "Portable X-ray", "Port-X IV", "SN-GD-001", (2023, 5, 20), EquipmentStatus::Active),
        seed_equipment("EQ_TRITON_001", "CN_TRITON", "Curing light", "Led-F", "SN-TT-001", (2023, 8, 10), EquipmentStatus::Active),
    ];

    EntityStore::new(clinics, users, equipment, Vec::new())
}

fn seed_equipment(
    id: &str,
    clinic_id: &str,
    name: &str,
    model: &str,
    serial_number: &str,
    (year, month, day): (i32, u32, u32),
    status: EquipmentStatus,
) -> Equipment {
    Equipment {
        id: id.to_string(),
        clinic_id: clinic_id.to_string(),
        name: name.to_string(),
        model: model.to_string(),
        serial_number: serial_number.to_string(),
        install_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_equipment_belongs_to_known_clinics() {
        let store = demo_store();
        for equipment in store.equipment() {
            assert!(store.clinic(&equipment.clinic_id).is_some());
        }
        for user in store.users().iter().filter(|u| u.role == Role::Clinic) {
            assert!(store.clinic(user.clinic_id.as_deref().unwrap()).is_some());
        }
    }
}
