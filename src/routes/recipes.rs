// ABOUTME: Recipe routes for photo analysis, text generation, and the saved library
// ABOUTME: Runs AI output through the normalizer and enforces ownership on saved rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipe routes
//!
//! `POST /api/analyze` takes a base64 food photo, `POST
//! /api/recipes/generate` a free-text request; both run the model response
//! through the normalizer and enrich the result with related videos. The
//! remaining routes manage the user's saved-recipe library.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::prompts;
use crate::models::{RecipeAnalysis, SavedRecipe, SubscriptionStatus, User};
use crate::normalizer;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use crate::storage::StorageProvider;

/// Photo analysis request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Base64 image payload, without a data-URL prefix
    pub image: String,
    /// Image media type; defaults to JPEG
    #[serde(default = "default_mime")]
    pub mime_type: String,
}

fn default_mime() -> String {
    "image/jpeg".to_owned()
}

/// Text-based recipe generation request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Save-recipe request; title defaults to the analyzed dish name
#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    pub title: Option<String>,
    pub analysis: serde_json::Value,
}

/// Saved-recipe update; both fields optional
#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub analysis: Option<serde_json::Value>,
}

/// Saved recipe rendered for clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeResponse {
    pub id: String,
    pub title: String,
    pub analysis: serde_json::Value,
    pub created_at: String,
}

impl SavedRecipeResponse {
    fn from_recipe(recipe: SavedRecipe) -> Self {
        Self {
            id: recipe.id.to_string(),
            title: recipe.title,
            analysis: recipe.analysis,
            created_at: recipe.created_at.to_rfc3339(),
        }
    }
}

/// Recipe route group
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Build the analysis and saved-recipe router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analyze", post(analyze_photo))
            .route("/api/recipes/generate", post(generate_from_text))
            .route("/api/recipes", get(list_recipes).post(save_recipe))
            .route(
                "/api/recipes/:id",
                get(get_recipe).patch(update_recipe).delete(delete_recipe),
            )
            .with_state(resources)
    }
}

/// Deduct one analysis credit from free-tier users
///
/// Premium subscribers analyze without limits; everyone else spends one
/// credit per AI call and is rejected once the balance reaches zero.
async fn consume_credit(resources: &ServerResources, user: &User) -> Result<(), AppError> {
    if user.subscription_status == SubscriptionStatus::Premium {
        return Ok(());
    }
    if user.credits <= 0 {
        return Err(AppError::permission_denied().with_details(serde_json::json!({
            "reason": "No analysis credits remaining",
            "credits": 0,
        })));
    }
    let mut updated = user.clone();
    updated.credits -= 1;
    resources
        .storage
        .update_user(&updated)
        .await
        .map_err(|e| AppError::database(format!("Failed to update credits: {e}")))
}

async fn analyze_photo(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> AppResult<Json<RecipeAnalysis>> {
    let auth = authenticate(&resources, &headers).await?;

    let image = request.image.trim();
    if image.is_empty() {
        return Err(AppError::invalid_input("Image payload must not be empty"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(image)
        .map_err(|_| AppError::invalid_input("Image payload is not valid base64"))?;
    consume_credit(&resources, &auth.user).await?;

    let prompt = prompts::recipe_analysis_prompt();
    let response = resources
        .llm
        .complete_with_image(&prompt, request.image.trim(), &request.mime_type)
        .await?;

    let mut analysis = normalizer::normalize_recipe_analysis(&response.content)?;
    normalizer::enrich_with_videos(&mut analysis, resources.video_search.as_ref()).await;

    info!(user_id = %auth.user.id, dish = %analysis.food_name, "analyzed food photo");
    Ok(Json(analysis))
}

async fn generate_from_text(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<RecipeAnalysis>> {
    let auth = authenticate(&resources, &headers).await?;

    let prompt_text = request.prompt.trim();
    if prompt_text.is_empty() {
        return Err(AppError::invalid_input("Prompt must not be empty"));
    }

    let prompt = prompts::recipe_from_text_prompt(prompt_text);
    let llm_request =
        crate::llm::ChatRequest::new(vec![crate::llm::ChatMessage::user(prompt)]);
    let response = resources.llm.complete(&llm_request).await?;

    let mut analysis = normalizer::normalize_recipe_analysis(&response.content)?;
    normalizer::enrich_with_videos(&mut analysis, resources.video_search.as_ref()).await;

    info!(user_id = %auth.user.id, dish = %analysis.food_name, "generated recipes from text");
    Ok(Json(analysis))
}

async fn list_recipes(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<SavedRecipeResponse>>> {
    let auth = authenticate(&resources, &headers).await?;
    let recipes = resources
        .storage
        .get_saved_recipes(auth.user.id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(
        recipes
            .into_iter()
            .map(SavedRecipeResponse::from_recipe)
            .collect(),
    ))
}

async fn save_recipe(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<SaveRecipeRequest>,
) -> AppResult<Json<SavedRecipeResponse>> {
    let auth = authenticate(&resources, &headers).await?;

    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            request.analysis["foodName"]
                .as_str()
                .filter(|name| !name.is_empty())
                .unwrap_or("Untitled recipe")
                .to_owned()
        });

    let recipe = SavedRecipe {
        id: Uuid::new_v4(),
        user_id: auth.user.id,
        title,
        analysis: request.analysis,
        created_at: Utc::now(),
    };
    resources
        .storage
        .create_saved_recipe(&recipe)
        .await
        .map_err(|e| AppError::database(format!("Failed to save recipe: {e}")))?;

    Ok(Json(SavedRecipeResponse::from_recipe(recipe)))
}

/// Load a saved recipe and enforce that `user_id` owns it
async fn owned_recipe(
    resources: &ServerResources,
    recipe_id: &str,
    user_id: Uuid,
) -> Result<SavedRecipe, AppError> {
    let id = Uuid::parse_str(recipe_id)
        .map_err(|_| AppError::invalid_input("Recipe id must be a UUID"))?;
    let recipe = resources
        .storage
        .get_saved_recipe_by_id(id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Recipe"))?;
    if recipe.user_id != user_id {
        return Err(AppError::permission_denied());
    }
    Ok(recipe)
}

async fn get_recipe(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<SavedRecipeResponse>> {
    let auth = authenticate(&resources, &headers).await?;
    let recipe = owned_recipe(&resources, &id, auth.user.id).await?;
    Ok(Json(SavedRecipeResponse::from_recipe(recipe)))
}

async fn update_recipe(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateRecipeRequest>,
) -> AppResult<Json<SavedRecipeResponse>> {
    let auth = authenticate(&resources, &headers).await?;
    let mut recipe = owned_recipe(&resources, &id, auth.user.id).await?;

    if let Some(title) = request.title.filter(|t| !t.trim().is_empty()) {
        recipe.title = title;
    }
    if let Some(analysis) = request.analysis {
        recipe.analysis = analysis;
    }
    resources
        .storage
        .update_saved_recipe(&recipe)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recipe: {e}")))?;

    Ok(Json(SavedRecipeResponse::from_recipe(recipe)))
}

async fn delete_recipe(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let auth = authenticate(&resources, &headers).await?;
    let recipe = owned_recipe(&resources, &id, auth.user.id).await?;
    resources
        .storage
        .delete_saved_recipe(recipe.id)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;
    Ok(Json(serde_json::json!({ "success": true })))
}
