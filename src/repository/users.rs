//! User rows

use sqlx::FromRow;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::User,
};

#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    full_name: String,
    role: String,
    clinic_id: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: row.role.parse().map_err(AppError::Internal)?,
            username: row.username,
            full_name: row.full_name,
            clinic_id: row.clinic_id,
        })
    }
}

impl Repository {
    /// List all users
    pub async fn users_list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT username, full_name, role, clinic_id FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}
