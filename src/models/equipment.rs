//! Equipment model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::EquipmentStatus;

/// Equipment record, owned by a clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    /// `EQ_{clinic code}_{time-ordered suffix}`
    pub id: String,
    pub clinic_id: String,
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub install_date: NaiveDate,
    /// Kept in sync with in-flight repairs
    pub status: EquipmentStatus,
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipment {
    /// Ignored for clinic staff, who always add to their own clinic
    pub clinic_id: Option<String>,
    #[validate(length(min = 1, message = "Equipment name is required"))]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial_number: String,
    /// Defaults to today
    pub install_date: Option<NaiveDate>,
    /// Defaults to Active
    pub status: Option<EquipmentStatus>,
}

/// Update equipment request (only provided fields change)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipment {
    #[validate(length(min = 1, message = "Equipment name cannot be empty"))]
    pub name: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub install_date: Option<NaiveDate>,
    pub status: Option<EquipmentStatus>,
}

impl UpdateEquipment {
    pub fn apply(&self, equipment: &mut Equipment) {
        if let Some(ref name) = self.name {
            equipment.name = name.clone();
        }
        if let Some(ref model) = self.model {
            equipment.model = model.clone();
        }
        if let Some(ref serial_number) = self.serial_number {
            equipment.serial_number = serial_number.clone();
        }
        if let Some(install_date) = self.install_date {
            equipment.install_date = install_date;
        }
        if let Some(status) = self.status {
            equipment.status = status;
        }
    }
}

/// Equipment list query
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EquipmentQuery {
    /// Restrict to one clinic (clinic staff are always restricted to their own)
    pub clinic_id: Option<String>,
    pub status: Option<EquipmentStatus>,
}
