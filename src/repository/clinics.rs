//! Clinic rows

use sqlx::FromRow;

use super::Repository;
use crate::{error::AppResult, models::Clinic};

#[derive(Debug, FromRow)]
struct ClinicRow {
    id: String,
    name: String,
    address: Option<String>,
}

impl From<ClinicRow> for Clinic {
    fn from(row: ClinicRow) -> Self {
        Clinic {
            id: row.id,
            name: row.name,
            address: row.address,
        }
    }
}

impl Repository {
    /// List all clinics
    pub async fn clinics_list(&self) -> AppResult<Vec<Clinic>> {
        let rows = sqlx::query_as::<_, ClinicRow>("SELECT id, name, address FROM clinics ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Clinic::from).collect())
    }
}
