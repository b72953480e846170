//! Repair request model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    enums::RepairStatus,
    equipment::Equipment,
    media::{classify_all, Evidence},
};

/// Repair request raised by a clinic for one piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    /// `REQ-{time-ordered suffix}`
    pub id: String,
    pub create_date: DateTime<Utc>,
    pub requester_username: String,
    pub clinic_id: String,
    pub equipment_id: String,
    /// Equipment name as it was when the request was created. This is a
    /// historical record and is never refreshed from the equipment.
    pub equipment_name: String,
    pub issue_description: String,
    pub images_before: Vec<String>,
    pub status: RepairStatus,
    pub approver_username: Option<String>,
    #[schema(value_type = Option<String>)]
    pub estimated_cost: Option<Decimal>,
    /// Set iff status is Completed
    #[schema(value_type = Option<String>)]
    pub repair_cost: Option<Decimal>,
    /// Set iff status is Completed
    pub warranty_months: Option<i32>,
    /// Set iff status is Completed
    pub completion_date: Option<DateTime<Utc>>,
    pub technician_notes: Option<String>,
    pub images_after: Vec<String>,
}

impl RepairRequest {
    /// Case-insensitive search over id, equipment name and requester
    pub fn matches_text(&self, needle: &str) -> bool {
        let haystack = format!("{}{}{}", self.id, self.equipment_name, self.requester_username);
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Cost counted in dashboards: only completed repairs cost anything
    pub fn effective_cost(&self) -> Decimal {
        match self.status {
            RepairStatus::Completed => self.repair_cost.unwrap_or_default(),
            _ => Decimal::ZERO,
        }
    }
}

/// Create repair request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepairRequest {
    /// Defaults to the caller's clinic for clinic staff
    pub clinic_id: Option<String>,
    #[validate(length(min = 1, message = "Equipment is required"))]
    pub equipment_id: String,
    #[validate(length(min = 1, message = "Issue description is required"))]
    pub issue_description: String,
    #[serde(default)]
    pub images_before: Vec<String>,
    #[schema(value_type = Option<String>)]
    pub estimated_cost: Option<Decimal>,
}

/// Completion data, also used to correct an already completed request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRepair {
    #[schema(value_type = String)]
    pub repair_cost: Decimal,
    pub warranty_months: i32,
    pub technician_notes: Option<String>,
    pub images_after: Option<Vec<String>>,
}

/// Cost estimate update
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetEstimate {
    #[schema(value_type = String)]
    pub estimated_cost: Decimal,
}

/// Request list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RequestQuery {
    /// Free text matched against id, equipment name and requester
    pub q: Option<String>,
    pub status: Option<RepairStatus>,
    pub clinic_id: Option<String>,
    /// Inclusive lower bound on creation date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on creation date, only used together with `from`
    pub to: Option<NaiveDate>,
}

/// Request with its equipment resolved for display
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequestDetails {
    pub request: RepairRequest,
    /// None when the equipment has since been deleted
    pub equipment: Option<Equipment>,
    pub equipment_display_name: String,
    pub clinic_name: Option<String>,
    pub evidence_before: Vec<Evidence>,
    pub evidence_after: Vec<Evidence>,
}

impl RepairRequestDetails {
    pub fn new(request: RepairRequest, equipment: Option<Equipment>, clinic_name: Option<String>) -> Self {
        let equipment_display_name = equipment
            .as_ref()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| request.equipment_name.clone());
        Self {
            evidence_before: classify_all(&request.images_before),
            evidence_after: classify_all(&request.images_after),
            equipment_display_name,
            clinic_name,
            equipment,
            request,
        }
    }
}
