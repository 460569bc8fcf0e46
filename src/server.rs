// ABOUTME: HTTP server assembly: router composition, middleware layers, and serving
// ABOUTME: Applies CORS, request tracing, and the request body size limit
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HTTP Server
//!
//! Composes the per-feature routers into one application router, applies
//! the middleware stack, and serves it with axum.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, BillingRoutes, ChatRoutes, HealthRoutes, MealPlanRoutes, RecipeRoutes,
};

/// Build the CORS layer from the configured origin list
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(values))
    }
}

/// Compose the full application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let max_body_bytes = resources.config.max_body_bytes;
    let cors = cors_layer(&resources.config.cors_allowed_origins);

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(RecipeRoutes::routes(resources.clone()))
        .merge(ChatRoutes::routes(resources.clone()))
        .merge(MealPlanRoutes::routes(resources.clone()))
        .merge(BillingRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
}

/// Bind and serve the application until the process is stopped
///
/// # Errors
///
/// Returns an error if the listen port cannot be bound.
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let port = resources.config.http_port;
    let router = build_router(resources);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("HTTP server listening on port {port}");

    axum::serve(listener, router)
        .await
        .context("HTTP server terminated")
}
