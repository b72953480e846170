//! Clinic model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Clinic (reference data, seeded once)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
}

impl Clinic {
    /// Short code used in equipment identifiers (`CN_GODEN` -> `GODEN`)
    pub fn code(&self) -> &str {
        clinic_code(&self.id)
    }
}

pub fn clinic_code(clinic_id: &str) -> &str {
    clinic_id
        .split('_')
        .nth(1)
        .filter(|code| !code.is_empty())
        .unwrap_or("XX")
}
