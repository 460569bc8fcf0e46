// ABOUTME: Health check route reporting service status and storage backend
// ABOUTME: Unauthenticated; suitable for load balancer probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health route

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::resources::ServerResources;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
}

/// Health route group
pub struct HealthRoutes;

impl HealthRoutes {
    /// Build the `/health` router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(health))
            .with_state(resources)
    }
}

async fn health(State(resources): State<Arc<ServerResources>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: crate::constants::service_names::DISH_DETECTIVE,
        version: env!("CARGO_PKG_VERSION"),
        storage: resources.storage.backend_info(),
    })
}
