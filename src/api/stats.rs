//! Statistics endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    services::stats::{RepairStats, StatsWindow, WindowQuery},
};

use super::AuthenticatedUser;

/// Optional clinic restriction; clinic staff are always restricted to their own
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatsScope {
    pub clinic_id: Option<String>,
}

/// Dashboard statistics for a window
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(WindowQuery, StatsScope),
    responses(
        (status = 200, description = "Statistics snapshot", body = RepairStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(window): Query<WindowQuery>,
    Query(scope): Query<StatsScope>,
) -> AppResult<Json<RepairStats>> {
    let clinic_id = actor.scoped_clinic().or(scope.clinic_id.as_deref());
    let stats = state
        .services
        .stats
        .get_stats(StatsWindow::from(&window), clinic_id)
        .await?;
    Ok(Json(stats))
}
