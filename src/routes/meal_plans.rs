// ABOUTME: Meal-plan route delegating to the AI path with template fallback
// ABOUTME: Always returns a usable plan for authenticated users
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meal-plan route
//!
//! The single endpoint never returns an AI failure to the client; the
//! generator falls back to templates internally.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::mealplan::{self, PlanPreferences};
use crate::models::MealPlan;
use crate::resources::ServerResources;
use crate::routes::authenticate;

/// Meal-plan route group
pub struct MealPlanRoutes;

impl MealPlanRoutes {
    /// Build the `/api/meal-plans` router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/meal-plans", post(create_meal_plan))
            .with_state(resources)
    }
}

async fn create_meal_plan(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(preferences): Json<PlanPreferences>,
) -> AppResult<Json<MealPlan>> {
    let auth = authenticate(&resources, &headers).await?;

    if preferences.meals_per_day != 2 && preferences.meals_per_day != 4 {
        return Err(AppError::invalid_input(
            "mealsPerDay must be 2 or 4",
        ));
    }

    let plan = mealplan::generate(resources.llm.as_ref(), &preferences).await;
    info!(
        user_id = %auth.user.id,
        days = plan.days.len(),
        "generated meal plan"
    );
    Ok(Json(plan))
}
