//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, clinics, equipment, health, requests, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Maintenance API",
        version = "1.0.0",
        description = "Equipment registry, repair request lifecycle and maintenance dashboards for a dental clinic chain"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::me,
        // Clinics
        clinics::list_clinics,
        clinics::clinic_summaries,
        clinics::clinic_overview,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        equipment::equipment_history,
        // Repair requests
        requests::list_requests,
        requests::create_request,
        requests::get_request,
        requests::approve_request,
        requests::reject_request,
        requests::start_request,
        requests::complete_request,
        requests::estimate_request,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::User,
            crate::models::Role,
            // Clinics
            crate::models::Clinic,
            crate::services::stats::ClinicSummary,
            crate::services::stats::ClinicOverview,
            // Equipment
            crate::models::Equipment,
            crate::models::EquipmentStatus,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::services::stats::EquipmentHistory,
            // Repair requests
            crate::models::RepairRequest,
            crate::models::RepairStatus,
            crate::models::repair_request::CreateRepairRequest,
            crate::models::repair_request::CompleteRepair,
            crate::models::repair_request::SetEstimate,
            crate::models::repair_request::RepairRequestDetails,
            crate::models::media::Evidence,
            crate::models::media::MediaKind,
            // Stats
            crate::services::stats::Period,
            crate::services::stats::RepairStats,
            crate::services::stats::StatusCounts,
            crate::services::stats::ClinicActivity,
            crate::services::stats::EquipmentFrequency,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "clinics", description = "Clinics and per-clinic dashboards"),
        (name = "equipment", description = "Equipment registry"),
        (name = "requests", description = "Repair request lifecycle"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
