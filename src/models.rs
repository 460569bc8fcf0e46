// ABOUTME: Common data models for users, sessions, saved recipes, and chat history
// ABOUTME: Also defines the RecipeAnalysis and MealPlan wire schema returned to clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Data Models
//!
//! Persistence entities (users, sessions, saved recipes, chat messages) and
//! the client-facing wire schema (`RecipeAnalysis`, `MealPlan`, `Video`).
//! Wire types serialize in camelCase to match the frontend contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Persistence Entities
// ============================================================================

/// Subscription state driven by Stripe webhook events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No active subscription; pay-per-use credits only
    Free,
    /// Active premium subscription
    Premium,
    /// Subscription cancelled, reverts to free at period end
    Cancelled,
}

impl SubscriptionStatus {
    /// String form stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the stored string form, defaulting unknown values to `Free`
    #[must_use]
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "premium" => Self::Premium,
            "cancelled" => Self::Cancelled,
            _ => Self::Free,
        }
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// PBKDF2 password hash (never serialized to clients)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Remaining analysis credits
    pub credits: i64,
    /// Subscription state
    pub subscription_status: SubscriptionStatus,
    /// Stripe customer ID once billing has been used
    pub stripe_customer_id: Option<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with default credits and no subscription
    #[must_use]
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            credits: 3,
            subscription_status: SubscriptionStatus::Free,
            stripe_customer_id: None,
            created_at: now,
            last_active: now,
        }
    }
}

/// An opaque bearer-token session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    /// The opaque token presented by the client
    pub token: String,
    /// Owning user
    pub user_id: Uuid,
    /// Issue timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp; expired sessions are rejected and deleted
    pub expires_at: DateTime<Utc>,
}

impl UserSession {
    /// Whether this session is past its expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A recipe analysis a user chose to keep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRecipe {
    /// Unique recipe ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display title (defaults to the analyzed dish name)
    pub title: String,
    /// Full `RecipeAnalysis` as stored JSON
    pub analysis: serde_json::Value,
    /// Save timestamp
    pub created_at: DateTime<Utc>,
}

/// One message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    /// Unique message ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// Role: `user` or `assistant`
    pub role: String,
    /// Message content
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Conversation summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Conversation ID
    pub conversation_id: Uuid,
    /// Title derived from the first user message
    pub title: String,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// Timestamp of the most recent message
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Recipe Analysis Wire Schema
// ============================================================================

/// A related video from the video-search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub description: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

/// Nutrition facts for one recipe. Calories are numeric; macros keep their
/// unit suffix (`"12g"`) as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInfo {
    pub calories: i64,
    pub protein: String,
    pub carbs: String,
    pub fats: String,
    pub fiber: String,
    pub sugar: String,
}

/// A named variation of a recipe with its adjustments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecipeVariation {
    pub name: String,
    pub adjustments: Vec<String>,
}

/// One structured recipe inside a `RecipeAnalysis`
///
/// Invariant: `ingredients` and `instructions` contain only plain strings;
/// the normalizer flattens any object entries the model produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition_info: NutritionInfo,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: String,
    pub chef_tips: Vec<String>,
    pub cultural_context: String,
    pub variations: Vec<RecipeVariation>,
    pub side_dish_suggestions: Vec<String>,
}

/// The complete analysis returned for one photo or prompt submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAnalysis {
    pub food_name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub recipes: Vec<Recipe>,
    pub youtube_videos: Vec<Video>,
}

// ============================================================================
// Meal Plan Wire Schema
// ============================================================================

/// Macro breakdown for one meal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MealMacros {
    pub protein: String,
    pub carbs: String,
    pub fats: String,
}

/// One meal slot in a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Meal {
    pub meal_type: String,
    pub name: String,
    pub cuisine: String,
    pub calories: i64,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub macros: MealMacros,
}

/// Nutrition totals for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyNutrition {
    pub calories: i64,
    pub protein: String,
    pub carbs: String,
    pub fats: String,
}

/// One day of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlanDay {
    /// Calendar date in `YYYY-MM-DD` form
    pub date: String,
    pub meals: Vec<Meal>,
    pub daily_nutrition: DailyNutrition,
}

/// Grocery items bucketed under one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GroceryCategory {
    pub category: String,
    pub items: Vec<String>,
}

/// Plan-wide averages and templated recommendations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionSummary {
    pub average_daily_calories: i64,
    pub average_daily_protein: String,
    pub average_daily_carbs: String,
    pub average_daily_fats: String,
    pub recommendations: Vec<String>,
}

/// A complete multi-day meal plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlan {
    pub days: Vec<MealPlanDay>,
    pub grocery_list: Vec<GroceryCategory>,
    pub nutrition_summary: NutritionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_defaults() {
        let user = User::new(
            "alice".into(),
            "alice@example.com".into(),
            "hash".into(),
        );
        assert_eq!(user.credits, 3);
        assert_eq!(user.subscription_status, SubscriptionStatus::Free);
        assert!(user.stripe_customer_id.is_none());
    }

    #[test]
    fn test_recipe_analysis_camel_case() {
        let analysis = RecipeAnalysis {
            food_name: "Tacos".into(),
            ..RecipeAnalysis::default()
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["foodName"], "Tacos");
        assert!(json["youtubeVideos"].is_array());
    }

    #[test]
    fn test_subscription_status_round_trip() {
        assert_eq!(
            SubscriptionStatus::from_str_lossy(SubscriptionStatus::Premium.as_str()),
            SubscriptionStatus::Premium
        );
        assert_eq!(
            SubscriptionStatus::from_str_lossy("garbage"),
            SubscriptionStatus::Free
        );
    }
}
