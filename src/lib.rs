//! Clinic Maintenance Tracker
//!
//! Equipment registry and repair request lifecycle for a chain of dental
//! clinics, with dashboards computed on demand. Changes are applied to an
//! in-memory entity store and reconciled with Postgres in the background.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
