//! Shared domain enums (roles, equipment status, repair status)
//!
//! All enums serialize with the exact labels stored in the database
//! (`Pending_Approval`, `In_Progress`, ...). `RepairStatus` carries the
//! request state machine through `allowed_next_states()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Technician,
    Clinic,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Technician => "Technician",
            Role::Clinic => "Clinic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Technician" => Ok(Role::Technician),
            "Clinic" => Ok(Role::Clinic),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

/// Operational status of a piece of equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum EquipmentStatus {
    #[default]
    Active,
    Maintenance,
    Disposed,
}

impl EquipmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            EquipmentStatus::Active => "Active",
            EquipmentStatus::Maintenance => "Maintenance",
            EquipmentStatus::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(EquipmentStatus::Active),
            "Maintenance" => Ok(EquipmentStatus::Maintenance),
            "Disposed" => Ok(EquipmentStatus::Disposed),
            _ => Err(format!("Invalid equipment status: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// RepairStatus
// ---------------------------------------------------------------------------

/// Status of a repair request through its lifecycle.
///
/// ```text
/// New ──────────────┬─→ Approved ─→ In_Progress ─→ Completed
/// Pending_Approval ─┤        └──────────────────────↗
///                   └─→ Rejected
/// ```
///
/// `New` and `Pending_Approval` both wait for an admin decision and behave
/// identically. `Completed` accepts re-entrant completion updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RepairStatus {
    New,
    #[serde(rename = "Pending_Approval")]
    PendingApproval,
    Approved,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Rejected,
}

impl RepairStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            RepairStatus::New => "New",
            RepairStatus::PendingApproval => "Pending_Approval",
            RepairStatus::Approved => "Approved",
            RepairStatus::InProgress => "In_Progress",
            RepairStatus::Completed => "Completed",
            RepairStatus::Rejected => "Rejected",
        }
    }

    /// Valid next states from the current state.
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            RepairStatus::New | RepairStatus::PendingApproval => {
                &[RepairStatus::Approved, RepairStatus::Rejected]
            }
            RepairStatus::Approved => &[RepairStatus::InProgress, RepairStatus::Completed],
            RepairStatus::InProgress => &[RepairStatus::Completed],
            RepairStatus::Completed => &[RepairStatus::Completed],
            RepairStatus::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Waiting for an admin to approve or reject
    pub const fn is_awaiting_decision(self) -> bool {
        matches!(self, RepairStatus::New | RepairStatus::PendingApproval)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RepairStatus::Completed | RepairStatus::Rejected)
    }

    /// Dashboard bucket this status is counted in
    pub const fn bucket(self) -> StatusBucket {
        match self {
            RepairStatus::New | RepairStatus::PendingApproval => StatusBucket::Pending,
            RepairStatus::Approved | RepairStatus::InProgress => StatusBucket::InProgress,
            RepairStatus::Completed => StatusBucket::Completed,
            RepairStatus::Rejected => StatusBucket::Rejected,
        }
    }

    /// Equipment status implied by entering this request status, if any
    pub const fn equipment_effect(self) -> Option<EquipmentStatus> {
        match self {
            RepairStatus::Approved | RepairStatus::InProgress => Some(EquipmentStatus::Maintenance),
            RepairStatus::Completed => Some(EquipmentStatus::Active),
            _ => None,
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RepairStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(RepairStatus::New),
            "Pending_Approval" => Ok(RepairStatus::PendingApproval),
            "Approved" => Ok(RepairStatus::Approved),
            "In_Progress" => Ok(RepairStatus::InProgress),
            "Completed" => Ok(RepairStatus::Completed),
            "Rejected" => Ok(RepairStatus::Rejected),
            _ => Err(format!("Invalid repair status: {}", s)),
        }
    }
}

/// Dashboard grouping of repair statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Pending,
    InProgress,
    Completed,
    Rejected,
}
