// ABOUTME: HTTP route groups for the Dish Detective API
// ABOUTME: Shared authentication helper plus per-feature route modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HTTP Routes
//!
//! Each feature area exposes a `XxxRoutes::routes(Arc<ServerResources>)`
//! constructor returning an axum `Router`; `server::build_router` composes
//! them. Handlers are thin wrappers delegating to the service layers.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::auth::AuthResult;
use crate::errors::AppError;
use crate::resources::ServerResources;

pub mod auth;
pub mod billing;
pub mod chat;
pub mod health;
pub mod meal_plans;
pub mod recipes;

pub use auth::AuthRoutes;
pub use billing::BillingRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use meal_plans::MealPlanRoutes;
pub use recipes::RecipeRoutes;

/// Authenticate a request from its headers via the session manager
///
/// # Errors
///
/// Propagates 401-level errors from [`crate::auth::SessionManager`].
pub(crate) async fn authenticate(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> Result<AuthResult, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    resources.sessions.authenticate(header).await
}
