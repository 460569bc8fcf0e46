// ABOUTME: Meal-plan generation combining the AI path with a deterministic fallback
// ABOUTME: Defines plan preferences and parses AI plans through the repair pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Meal Planning
//!
//! Two paths produce a [`MealPlan`]: the AI path (prompt built from the
//! user's preferences, response run through the JSON repair pipeline) and
//! the template [`fallback`] generator. The AI path failing for any reason
//! is not an error; it is logged and the fallback takes over. This is the
//! only place in the system where a failure is locally recovered.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::models::MealPlan;
use crate::normalizer::{repair_and_parse, NormalizeError};

pub mod fallback;

/// User preferences controlling plan shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreferences {
    /// `"1-week"`, `"2-weeks"`, or `"4-weeks"`
    pub duration: String,
    /// 2 (lunch and dinner) or 4 (all meal slots)
    pub meals_per_day: u8,
    /// Preferred cuisines, e.g. `["Italian", "Indian"]`
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    /// Free-text goal, e.g. `"weight loss"`
    #[serde(default)]
    pub health_goal: String,
}

impl PlanPreferences {
    /// Plan length in days; unrecognized durations default to one week
    #[must_use]
    pub fn duration_days(&self) -> usize {
        match self.duration.as_str() {
            "2-weeks" => 14,
            "4-weeks" => 30,
            _ => 7,
        }
    }

    /// Meal slots per day, in serving order
    #[must_use]
    pub fn meal_types(&self) -> &'static [&'static str] {
        if self.meals_per_day == 4 {
            &["Breakfast", "Lunch", "Snack", "Dinner"]
        } else {
            &["Lunch", "Dinner"]
        }
    }
}

/// Parse an AI meal-plan response through the repair pipeline
///
/// # Errors
///
/// Propagates repair-pipeline failures and reports plans with no days as
/// schema-invalid so the caller falls back.
pub fn parse_meal_plan(raw: &str) -> Result<MealPlan, NormalizeError> {
    let value = repair_and_parse(raw)?;
    let plan: MealPlan = serde_json::from_value(value)
        .map_err(|e| NormalizeError::SchemaValidation(e.to_string()))?;
    if plan.days.is_empty() {
        return Err(NormalizeError::SchemaValidation(
            "meal plan contains no days".to_owned(),
        ));
    }
    Ok(plan)
}

/// Generate a meal plan, never failing
///
/// Tries the AI path first; any API or parse failure is logged and replaced
/// by the template fallback.
pub async fn generate(llm: &dyn LlmProvider, preferences: &PlanPreferences) -> MealPlan {
    let prompt = prompts::meal_plan_prompt(preferences);
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

    match llm.complete(&request).await {
        Ok(response) => match parse_meal_plan(&response.content) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("AI meal plan unusable, using template fallback: {e}");
                fallback::generate_plan(preferences)
            }
        },
        Err(e) => {
            warn!("AI meal plan request failed, using template fallback: {e}");
            fallback::generate_plan(preferences)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferences(duration: &str, meals: u8) -> PlanPreferences {
        PlanPreferences {
            duration: duration.to_owned(),
            meals_per_day: meals,
            cuisine_preferences: vec!["Italian".to_owned()],
            health_goal: "weight loss".to_owned(),
        }
    }

    #[test]
    fn test_duration_mapping() {
        assert_eq!(preferences("1-week", 2).duration_days(), 7);
        assert_eq!(preferences("2-weeks", 2).duration_days(), 14);
        assert_eq!(preferences("4-weeks", 2).duration_days(), 30);
        assert_eq!(preferences("someday", 2).duration_days(), 7);
    }

    #[test]
    fn test_meal_slot_selection() {
        assert_eq!(preferences("1-week", 2).meal_types(), ["Lunch", "Dinner"]);
        assert_eq!(
            preferences("1-week", 4).meal_types(),
            ["Breakfast", "Lunch", "Snack", "Dinner"]
        );
    }

    #[test]
    fn test_parse_rejects_empty_plan() {
        let error = parse_meal_plan(r#"{"days": []}"#).unwrap_err();
        assert!(matches!(error, NormalizeError::SchemaValidation(_)));
    }

    #[test]
    fn test_parse_accepts_fenced_plan() {
        let raw = "```json\n{\"days\": [{\"date\": \"2026-01-01\", \"meals\": []}],}\n```";
        let plan = parse_meal_plan(raw).unwrap();
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].date, "2026-01-01");
    }
}
