// ABOUTME: Prompt builders for photo analysis, chat recipe generation, and meal plans
// ABOUTME: Every prompt pins the exact JSON shape the normalizer expects back
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction
//!
//! The model is asked for strict JSON matching the wire schema. It does not
//! always comply, which is why the normalizer exists; the prompts here just
//! maximize the odds of a clean response.

use crate::mealplan::PlanPreferences;

/// JSON shape the model must return for a recipe analysis
const ANALYSIS_SCHEMA: &str = r#"{
  "foodName": "name of the dish",
  "description": "two to three sentence description",
  "tags": ["cuisine or dietary tags"],
  "recipes": [
    {
      "title": "recipe name",
      "description": "short description",
      "ingredients": ["quantity and ingredient as one string"],
      "instructions": ["one step per string"],
      "nutritionInfo": {
        "calories": 450,
        "protein": "25g",
        "carbs": "40g",
        "fats": "18g",
        "fiber": "5g",
        "sugar": "8g"
      },
      "prepTime": "15 minutes",
      "cookTime": "30 minutes",
      "servings": "4",
      "difficulty": "Easy | Medium | Hard",
      "chefTips": ["practical tips"],
      "culturalContext": "one paragraph of background",
      "variations": [{ "name": "variation name", "adjustments": ["changes"] }],
      "sideDishSuggestions": ["side dishes"]
    }
  ]
}"#;

/// Prompt for identifying a dish from a photo and producing recipes
#[must_use]
pub fn recipe_analysis_prompt() -> String {
    format!(
        "You are an expert chef and food historian. Identify the dish in the \
         attached photo and produce detailed recipes for it.\n\n\
         Respond with ONLY a JSON object, no markdown, no commentary, exactly \
         matching this structure:\n{ANALYSIS_SCHEMA}\n\n\
         Provide 2 to 3 recipe variants (classic, quick, and healthy where it \
         makes sense). Ingredients and instructions must be arrays of plain \
         strings. If the photo does not show food, set foodName to \
         \"Unknown\" and return an empty recipes array."
    )
}

/// Prompt for generating recipes from a free-text request
#[must_use]
pub fn recipe_from_text_prompt(request: &str) -> String {
    format!(
        "You are an expert chef. The user wants: {request}\n\n\
         Respond with ONLY a JSON object, no markdown, no commentary, exactly \
         matching this structure:\n{ANALYSIS_SCHEMA}\n\n\
         Provide 1 to 3 recipes that satisfy the request. Ingredients and \
         instructions must be arrays of plain strings."
    )
}

/// System prompt for the conversational recipe assistant
#[must_use]
pub fn chat_system_prompt() -> String {
    "You are Dish Detective, a friendly cooking assistant. Answer cooking \
     questions conversationally. When the user asks for a recipe, include \
     the full ingredient list and numbered steps in your reply. Keep answers \
     focused on food, cooking, and nutrition."
        .to_owned()
}

/// Prompt asking the model for a complete meal plan
#[must_use]
pub fn meal_plan_prompt(preferences: &PlanPreferences) -> String {
    let cuisines = if preferences.cuisine_preferences.is_empty() {
        "any cuisine".to_owned()
    } else {
        preferences.cuisine_preferences.join(", ")
    };

    format!(
        "Create a {days}-day meal plan with {meals} meals per day \
         ({meal_types}). Preferred cuisines: {cuisines}. \
         Health goal: {goal}.\n\n\
         Respond with ONLY a JSON object, no markdown, matching:\n\
         {{\n\
           \"days\": [\n\
             {{\n\
               \"date\": \"YYYY-MM-DD\",\n\
               \"meals\": [\n\
                 {{\n\
                   \"mealType\": \"Breakfast\",\n\
                   \"name\": \"meal name\",\n\
                   \"cuisine\": \"cuisine\",\n\
                   \"calories\": 400,\n\
                   \"ingredients\": [\"items\"],\n\
                   \"instructions\": \"short preparation summary\",\n\
                   \"macros\": {{ \"protein\": \"20g\", \"carbs\": \"45g\", \"fats\": \"12g\" }}\n\
                 }}\n\
               ],\n\
               \"dailyNutrition\": {{ \"calories\": 1800, \"protein\": \"90g\", \"carbs\": \"200g\", \"fats\": \"60g\" }}\n\
             }}\n\
           ],\n\
           \"groceryList\": [{{ \"category\": \"Proteins\", \"items\": [\"chicken breast\"] }}],\n\
           \"nutritionSummary\": {{\n\
             \"averageDailyCalories\": 1800,\n\
             \"averageDailyProtein\": \"90g\",\n\
             \"averageDailyCarbs\": \"200g\",\n\
             \"averageDailyFats\": \"60g\",\n\
             \"recommendations\": [\"short actionable sentences\"]\n\
           }}\n\
         }}\n\n\
         Dates start today. Every day must contain exactly the listed meal \
         types in order.",
        days = preferences.duration_days(),
        meals = preferences.meal_types().len(),
        meal_types = preferences.meal_types().join(", "),
        goal = preferences.health_goal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_pins_schema() {
        let prompt = recipe_analysis_prompt();
        assert!(prompt.contains("\"foodName\""));
        assert!(prompt.contains("\"nutritionInfo\""));
        assert!(prompt.contains("ONLY a JSON object"));
    }

    #[test]
    fn test_meal_plan_prompt_reflects_preferences() {
        let preferences = PlanPreferences {
            duration: "2-weeks".into(),
            meals_per_day: 4,
            cuisine_preferences: vec!["Italian".into(), "Indian".into()],
            health_goal: "muscle gain".into(),
        };
        let prompt = meal_plan_prompt(&preferences);
        assert!(prompt.contains("14-day meal plan"));
        assert!(prompt.contains("Italian, Indian"));
        assert!(prompt.contains("muscle gain"));
        assert!(prompt.contains("Breakfast, Lunch, Snack, Dinner"));
    }
}
