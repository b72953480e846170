//! Repair request domain methods on Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::RepairRequest,
};

#[derive(Debug, FromRow)]
struct RepairRequestRow {
    id: String,
    create_date: DateTime<Utc>,
    requester_username: String,
    clinic_id: String,
    equipment_id: String,
    equipment_name: String,
    issue_description: String,
    images_before: Option<Vec<String>>,
    status: String,
    approver_username: Option<String>,
    estimated_cost: Option<Decimal>,
    repair_cost: Option<Decimal>,
    warranty_months: Option<i32>,
    completion_date: Option<DateTime<Utc>>,
    technician_notes: Option<String>,
    images_after: Option<Vec<String>>,
}

impl TryFrom<RepairRequestRow> for RepairRequest {
    type Error = AppError;

    fn try_from(row: RepairRequestRow) -> Result<Self, Self::Error> {
        Ok(RepairRequest {
            status: row.status.parse().map_err(AppError::Internal)?,
            id: row.id,
            create_date: row.create_date,
            requester_username: row.requester_username,
            clinic_id: row.clinic_id,
            equipment_id: row.equipment_id,
            equipment_name: row.equipment_name,
            issue_description: row.issue_description,
            images_before: row.images_before.unwrap_or_default(),
            approver_username: row.approver_username,
            estimated_cost: row.estimated_cost,
            repair_cost: row.repair_cost,
            warranty_months: row.warranty_months,
            completion_date: row.completion_date,
            technician_notes: row.technician_notes,
            images_after: row.images_after.unwrap_or_default(),
        })
    }
}

const REQUEST_COLUMNS: &str = "id, create_date, requester_username, clinic_id, equipment_id, \
     equipment_name, issue_description, images_before, status, approver_username, estimated_cost, \
     repair_cost, warranty_months, completion_date, technician_notes, images_after";

impl Repository {
    /// List all repair requests, newest first
    pub async fn repair_requests_list(&self) -> AppResult<Vec<RepairRequest>> {
        let query = format!(
            "SELECT {} FROM repair_requests ORDER BY create_date DESC",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, RepairRequestRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RepairRequest::try_from).collect()
    }

    /// Insert a new repair request
    pub async fn repair_requests_insert(&self, request: &RepairRequest) -> AppResult<()> {
        let query = format!(
            "INSERT INTO repair_requests ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            REQUEST_COLUMNS
        );
        sqlx::query(&query)
            .bind(&request.id)
            .bind(request.create_date)
            .bind(&request.requester_username)
            .bind(&request.clinic_id)
            .bind(&request.equipment_id)
            .bind(&request.equipment_name)
            .bind(&request.issue_description)
            .bind(&request.images_before)
            .bind(request.status.as_str())
            .bind(&request.approver_username)
            .bind(request.estimated_cost)
            .bind(request.repair_cost)
            .bind(request.warranty_months)
            .bind(request.completion_date)
            .bind(&request.technician_notes)
            .bind(&request.images_after)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrite the mutable columns of a repair request
    pub async fn repair_requests_update(&self, request: &RepairRequest) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE repair_requests
            SET status = $2, approver_username = $3, estimated_cost = $4, repair_cost = $5,
                warranty_months = $6, completion_date = $7, technician_notes = $8, images_after = $9
            WHERE id = $1
            "#,
        )
        .bind(&request.id)
        .bind(request.status.as_str())
        .bind(&request.approver_username)
        .bind(request.estimated_cost)
        .bind(request.repair_cost)
        .bind(request.warranty_months)
        .bind(request.completion_date)
        .bind(&request.technician_notes)
        .bind(&request.images_after)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Repair request {} not found", request.id)));
        }
        Ok(())
    }
}
