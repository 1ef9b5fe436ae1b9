//! Health check endpoint for probes and monitoring.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether a commerce platform is configured; without one the service
    /// is in setup mode and purge endpoints return an error.
    pub platform_configured: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        platform_configured: state.controller.is_some(),
    })
}
