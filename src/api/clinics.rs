//! Clinic endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{Clinic, Role},
    services::stats::{ClinicOverview, ClinicSummary, StatsWindow, WindowQuery},
};

use super::AuthenticatedUser;

/// List clinics
#[utoipa::path(
    get,
    path = "/clinics",
    tag = "clinics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Clinic list", body = Vec<Clinic>)
    )
)]
pub async fn list_clinics(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<Vec<Clinic>>> {
    let clinics = state.services.store().read().await.clinics().to_vec();
    Ok(Json(clinics))
}

/// Request count and cost per clinic for a window
#[utoipa::path(
    get,
    path = "/clinics/summary",
    tag = "clinics",
    security(("bearer_auth" = [])),
    params(WindowQuery),
    responses(
        (status = 200, description = "One card per clinic", body = Vec<ClinicSummary>),
        (status = 403, description = "Clinic staff", body = crate::error::ErrorResponse)
    )
)]
pub async fn clinic_summaries(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<Vec<ClinicSummary>>> {
    actor.require_role(&[Role::Admin, Role::Technician], "compare clinics")?;
    let summaries = state
        .services
        .stats
        .clinic_summaries(StatsWindow::from(&query))
        .await?;
    Ok(Json(summaries))
}

/// Lifetime overview of one clinic
#[utoipa::path(
    get,
    path = "/clinics/{id}/overview",
    tag = "clinics",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Clinic ID")),
    responses(
        (status = 200, description = "Clinic overview", body = ClinicOverview),
        (status = 404, description = "Unknown clinic", body = crate::error::ErrorResponse)
    )
)]
pub async fn clinic_overview(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ClinicOverview>> {
    if actor.scoped_clinic().is_some_and(|own| own != id) {
        return Err(AppError::Authorization(format!(
            "{} cannot view clinic {}",
            actor.username, id
        )));
    }
    let overview = state.services.stats.clinic_overview(&id).await?;
    Ok(Json(overview))
}
