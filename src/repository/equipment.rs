//! Equipment domain methods on Repository

use chrono::NaiveDate;
use sqlx::FromRow;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::Equipment,
};

#[derive(Debug, FromRow)]
struct EquipmentRow {
    id: String,
    clinic_id: String,
    name: String,
    model: Option<String>,
    serial_number: Option<String>,
    install_date: NaiveDate,
    status: String,
}

impl TryFrom<EquipmentRow> for Equipment {
    type Error = AppError;

    fn try_from(row: EquipmentRow) -> Result<Self, Self::Error> {
        Ok(Equipment {
            status: row.status.parse().map_err(AppError::Internal)?,
            id: row.id,
            clinic_id: row.clinic_id,
            name: row.name,
            model: row.model.unwrap_or_default(),
            serial_number: row.serial_number.unwrap_or_default(),
            install_date: row.install_date,
        })
    }
}

impl Repository {
    /// List all equipment
    pub async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, EquipmentRow>(
            r#"
            SELECT id, clinic_id, name, model, serial_number, install_date, status
            FROM equipment
            ORDER BY clinic_id, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Equipment::try_from).collect()
    }

    /// Create equipment
    pub async fn equipment_insert(&self, equipment: &Equipment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO equipment (id, clinic_id, name, model, serial_number, install_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&equipment.id)
        .bind(&equipment.clinic_id)
        .bind(&equipment.name)
        .bind(&equipment.model)
        .bind(&equipment.serial_number)
        .bind(equipment.install_date)
        .bind(equipment.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update equipment
    pub async fn equipment_update(&self, equipment: &Equipment) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE equipment
            SET name = $2, model = $3, serial_number = $4, install_date = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(&equipment.id)
        .bind(&equipment.name)
        .bind(&equipment.model)
        .bind(&equipment.serial_number)
        .bind(equipment.install_date)
        .bind(equipment.status.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", equipment.id)));
        }
        Ok(())
    }

    /// Delete equipment
    pub async fn equipment_delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }
}
