//! API integration tests
//!
//! The in-process tests drive the router directly over the demo data set.
//! Tests marked `#[ignore]` expect a server on localhost:8080.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_maintenance::{
    api,
    config::{AppConfig, AuthConfig},
    repository::NoopPersistence,
    services::{
        notifications::LogNotifier,
        sync::{RetryConfig, SyncQueue, SyncWorker},
        Services,
    },
    store::seed::demo_store,
    AppState,
};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn test_app() -> Router {
    let config = AppConfig {
        server: Default::default(),
        database: Default::default(),
        auth: AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            jwt_expiration_hours: 1,
        },
        logging: Default::default(),
        notifications: Default::default(),
        sync: Default::default(),
        stats: Default::default(),
    };

    let (queue, rx) = SyncQueue::channel();
    SyncWorker::new(rx, Arc::new(NoopPersistence), Arc::new(LogNotifier), RetryConfig::none()).spawn();
    let services = Services::new(
        demo_store().into_shared(),
        queue,
        config.auth.clone(),
        config.stats.offset(),
    );

    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = call(app, Method::POST, "/api/v1/auth/login", None, Some(json!({ "username": username }))).await;
    assert_eq!(status, StatusCode::OK, "login failed for {}: {}", username, body);
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = test_app();
    let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["persistent"], false);

    let (status, body) = call(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/requests/{id}/approve"].is_object());
}

#[tokio::test]
async fn test_login_and_me() {
    let app = test_app();
    let (status, body) = call(&app, Method::POST, "/api/v1/auth/login", None, Some(json!({ "username": "nobody" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);

    let token = login(&app, "cn_goden").await;
    let (status, body) = call(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Clinic");
    assert_eq!(body["clinicId"], "CN_GODEN");
}

#[tokio::test]
async fn test_requires_token() {
    let app = test_app();
    let (status, _) = call(&app, Method::GET, "/api/v1/requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/v1/requests", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repair_lifecycle_over_http() {
    let app = test_app();
    let staff = login(&app, "cn_benluc").await;
    let admin = login(&app, "admin").await;
    let technician = login(&app, "technician").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/v1/requests",
        Some(&staff),
        Some(json!({
            "equipmentId": "EQ_BENLUC_001",
            "issueDescription": "Chair will not lift",
            "imagesBefore": ["https://cdn.example/before.jpg", "https://cdn.example/before.MP4"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["status"], "New");
    assert_eq!(created["clinicId"], "CN_BENLUC");
    let id = created["id"].as_str().unwrap().to_string();

    // clinic staff cannot decide
    let (status, _) = call(&app, Method::POST, &format!("/api/v1/requests/{}/approve", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = call(&app, Method::POST, &format!("/api/v1/requests/{}/approve", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "Approved");
    assert_eq!(approved["approverUsername"], "admin");

    let (_, equipment) = call(&app, Method::GET, "/api/v1/equipment/EQ_BENLUC_001", Some(&staff), None).await;
    assert_eq!(equipment["status"], "Maintenance");

    let (status, body) = call(&app, Method::POST, &format!("/api/v1/requests/{}/reject", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7);

    let (status, started) = call(&app, Method::POST, &format!("/api/v1/requests/{}/start", id), Some(&technician), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "In_Progress");

    let (status, completed) = call(
        &app,
        Method::POST,
        &format!("/api/v1/requests/{}/complete", id),
        Some(&technician),
        Some(json!({ "repairCost": 5000000, "warrantyMonths": 6, "technicianNotes": "Replaced motor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", completed);
    assert_eq!(completed["status"], "Completed");
    assert!(completed["completionDate"].is_string());

    let (_, equipment) = call(&app, Method::GET, "/api/v1/equipment/EQ_BENLUC_001", Some(&admin), None).await;
    assert_eq!(equipment["status"], "Active");

    let (status, details) = call(&app, Method::GET, &format!("/api/v1/requests/{}", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["evidenceBefore"][1]["kind"], "video");
    assert_eq!(details["equipmentDisplayName"], "Dental chair K3");

    let (status, stats) = call(&app, Method::GET, "/api/v1/stats?period=all", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_requests"], 1);
    assert_eq!(stats["by_status"]["completed"], 1);
    assert_eq!(stats["total_cost"], "5000000");
    assert_eq!(stats["most_active_clinic"]["clinic_id"], "CN_BENLUC");

    let (status, history) = call(&app, Method::GET, "/api/v1/equipment/EQ_BENLUC_001/history", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["repair_count"], 1);
}

#[tokio::test]
async fn test_deleted_equipment_keeps_request() {
    let app = test_app();
    let staff = login(&app, "cn_triton").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/v1/requests",
        Some(&staff),
        Some(json!({ "equipmentId": "EQ_TRITON_001", "issueDescription": "Light flickers" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::DELETE, "/api/v1/equipment/EQ_TRITON_001", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, details) = call(&app, Method::GET, &format!("/api/v1/requests/{}", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(details["equipment"].is_null());
    assert_eq!(details["equipmentDisplayName"], "Curing light");
}

#[tokio::test]
async fn test_clinic_staff_are_scoped() {
    let app = test_app();
    let goden = login(&app, "cn_goden").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/requests",
        Some(&goden),
        Some(json!({ "equipmentId": "EQ_BENLUC_001", "issueDescription": "Not ours" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, equipment) = call(&app, Method::GET, "/api/v1/equipment", Some(&goden), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = equipment.as_array().unwrap();
    assert!(!listed.is_empty());
    assert!(listed.iter().all(|e| e["clinicId"] == "CN_GODEN"));

    let (status, _) = call(&app, Method::GET, "/api/v1/equipment/EQ_BENLUC_001/history", Some(&goden), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/api/v1/clinics/summary", Some(&goden), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/api/v1/clinics/CN_SG1/overview", Some(&goden), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, overview) = call(&app, Method::GET, "/api/v1/clinics/CN_GODEN/overview", Some(&goden), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["equipment_count"], 1);
}

#[tokio::test]
async fn test_equipment_registration() {
    let app = test_app();
    let admin = login(&app, "admin").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/v1/equipment",
        Some(&admin),
        Some(json!({ "clinicId": "CN_SG1", "name": "Autoclave", "installDate": "2024-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert!(created["id"].as_str().unwrap().starts_with("EQ_SG1_"));
    assert_eq!(created["status"], "Active");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/equipment",
        Some(&admin),
        Some(json!({ "clinicId": "CN_SG1", "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, clinics) = call(&app, Method::GET, "/api/v1/clinics", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clinics.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upper_bound_alone_is_ignored() {
    let app = test_app();
    let staff = login(&app, "cn_sg1").await;
    let admin = login(&app, "admin").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/equipment",
        Some(&admin),
        Some(json!({ "clinicId": "CN_SG1", "name": "Compressor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, equipment) = call(&app, Method::GET, "/api/v1/equipment", Some(&staff), None).await;
    let equipment_id = equipment[0]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/requests",
        Some(&staff),
        Some(json!({ "equipmentId": equipment_id, "issueDescription": "Pressure drops" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // a past `to` without `from` leaves the current month in effect
    let (status, stats) = call(&app, Method::GET, "/api/v1/stats?to=2000-01-01", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_requests"], 1);

    let (status, listed) = call(&app, Method::GET, "/api/v1/requests?to=2000-01-01", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, bounded) = call(
        &app,
        Method::GET,
        "/api/v1/stats?from=1999-01-01&to=2000-01-01",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(bounded["total_requests"], 0);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_live_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_live_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["tokenType"], "Bearer");
}
