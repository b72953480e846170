//! Repair request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        repair_request::{CompleteRepair, CreateRepairRequest, RepairRequestDetails, RequestQuery, SetEstimate},
        RepairRequest,
    },
};

use super::AuthenticatedUser;

/// List repair requests, newest first
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Repair requests", body = Vec<RepairRequest>)
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<RepairRequest>>> {
    let requests = state.services.requests.list(&actor, &query).await?;
    Ok(Json(requests))
}

/// Report broken equipment
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateRepairRequest,
    responses(
        (status = 201, description = "Request created", body = RepairRequest),
        (status = 400, description = "Invalid data", body = crate::error::ErrorResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(data): Json<CreateRepairRequest>,
) -> AppResult<(StatusCode, Json<RepairRequest>)> {
    let request = state.services.requests.create(&actor, data).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Get a request with its equipment and classified evidence
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RepairRequestDetails),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<RepairRequestDetails>> {
    let details = state.services.requests.get(&actor, &id).await?;
    Ok(Json(details))
}

/// Approve a request (admin)
#[utoipa::path(
    post,
    path = "/requests/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = RepairRequest),
        (status = 409, description = "Request is not awaiting a decision", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<RepairRequest>> {
    let request = state.services.requests.approve(&actor, &id).await?;
    Ok(Json(request))
}

/// Reject a request (admin)
#[utoipa::path(
    post,
    path = "/requests/{id}/reject",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = RepairRequest),
        (status = 409, description = "Request is not awaiting a decision", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<RepairRequest>> {
    let request = state.services.requests.reject(&actor, &id).await?;
    Ok(Json(request))
}

/// Mark an approved request as in progress
#[utoipa::path(
    post,
    path = "/requests/{id}/start",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Work started", body = RepairRequest),
        (status = 409, description = "Request is not approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn start_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<RepairRequest>> {
    let request = state.services.requests.begin_work(&actor, &id).await?;
    Ok(Json(request))
}

/// Record the repair outcome, or correct it on a completed request
#[utoipa::path(
    post,
    path = "/requests/{id}/complete",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    request_body = CompleteRepair,
    responses(
        (status = 200, description = "Request completed", body = RepairRequest),
        (status = 400, description = "Negative cost or warranty", body = crate::error::ErrorResponse),
        (status = 409, description = "Request was never approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<CompleteRepair>,
) -> AppResult<Json<RepairRequest>> {
    let request = state.services.requests.complete(&actor, &id, data).await?;
    Ok(Json(request))
}

/// Set the estimated cost
#[utoipa::path(
    post,
    path = "/requests/{id}/estimate",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    request_body = SetEstimate,
    responses(
        (status = 200, description = "Estimate recorded", body = RepairRequest),
        (status = 409, description = "Request already completed", body = crate::error::ErrorResponse)
    )
)]
pub async fn estimate_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<SetEstimate>,
) -> AppResult<Json<RepairRequest>> {
    let request = state.services.requests.set_estimate(&actor, &id, data).await?;
    Ok(Json(request))
}
