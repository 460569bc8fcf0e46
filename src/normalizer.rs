// ABOUTME: AI-response normalizer turning free-form model text into validated schema values
// ABOUTME: Bounded JSON repair pipeline plus field-level coercion for recipe payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # AI Response Normalizer
//!
//! Generative models are asked for strict JSON but routinely wrap it in
//! prose or markdown fences, leave trailing commas, or emit objects where
//! strings were requested. This module converts such a blob into a valid
//! [`RecipeAnalysis`] (or a generic [`serde_json::Value`] for other
//! payloads) without ever panicking on cosmetic malformation.
//!
//! Repair is a fixed pipeline, not an open-ended cleanup loop: candidate
//! extraction, trailing-comma stripping, then at most two parse attempts
//! (plain, then one aggressive pass that quotes bare keys and converts
//! single quotes). A response that survives neither attempt is reported as
//! a typed failure.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::limits::MAX_RELATED_VIDEOS;
use crate::errors::{AppError, ErrorCode};
use crate::external::VideoSearch;
use crate::models::{
    NutritionInfo, Recipe, RecipeAnalysis, RecipeVariation,
};

/// Typed normalization failure
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The model returned nothing, or nothing but whitespace
    #[error("AI response was empty")]
    EmptyResponse,
    /// Both parse attempts failed
    #[error("AI response is not parsable JSON: {0}")]
    UnparsableJson(String),
    /// Parsed JSON whose shape cannot be coerced into the target schema
    #[error("AI response does not match the expected schema: {0}")]
    SchemaValidation(String),
}

impl From<NormalizeError> for AppError {
    fn from(error: NormalizeError) -> Self {
        let code = match &error {
            NormalizeError::EmptyResponse => ErrorCode::AiEmptyResponse,
            NormalizeError::UnparsableJson(_) => ErrorCode::AiUnparsableResponse,
            NormalizeError::SchemaValidation(_) => ErrorCode::AiSchemaInvalid,
        };
        Self::new(code, "Failed to process the AI response")
            .with_details(serde_json::json!({ "reason": error.to_string() }))
    }
}

// ============================================================================
// Repair Pipeline
// ============================================================================

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex")
    })
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid regex"))
}

fn bare_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid regex")
    })
}

/// Pick the most promising JSON candidate out of the raw model text
fn extract_candidate(raw: &str) -> String {
    if let Some(captures) = fenced_block_re().captures(raw) {
        if let Some(interior) = captures.get(1) {
            return interior.as_str().trim().to_owned();
        }
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return raw[start..=end].to_owned();
        }
    }

    raw.trim().to_owned()
}

/// Strip commas that directly precede a closing brace or bracket
fn strip_trailing_commas(text: &str) -> String {
    trailing_comma_re().replace_all(text, "$1").into_owned()
}

/// Quote bare object keys and convert single quotes to double quotes
fn aggressive_repair(text: &str) -> String {
    let quoted_keys = bare_key_re().replace_all(text, "$1\"$2\":");
    let double_quoted = quoted_keys.replace('\'', "\"");
    strip_trailing_commas(&double_quoted)
}

/// Extract and parse the JSON object embedded in a raw model response
///
/// Exactly two parse attempts are made: one on the extracted candidate with
/// trailing commas stripped, and one after the aggressive repair pass.
///
/// # Errors
///
/// [`NormalizeError::EmptyResponse`] for blank input,
/// [`NormalizeError::UnparsableJson`] when both attempts fail.
pub fn repair_and_parse(raw: &str) -> Result<serde_json::Value, NormalizeError> {
    if raw.trim().is_empty() {
        return Err(NormalizeError::EmptyResponse);
    }

    let candidate = extract_candidate(raw);
    if candidate.is_empty() {
        return Err(NormalizeError::EmptyResponse);
    }

    let cleaned = strip_trailing_commas(&candidate);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            debug!("first parse attempt failed, applying aggressive repair");
            let repaired = aggressive_repair(&cleaned);
            serde_json::from_str(&repaired).map_err(|_| {
                NormalizeError::UnparsableJson(first_error.to_string())
            })
        }
    }
}

// ============================================================================
// Field Coercion
// ============================================================================

/// Coerce any scalar to a string; missing or non-scalar values become `""`
fn coerce_string(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Look up a field as text, treating the literal `"null"` as absent
///
/// Models emit bare numbers for quantities and durations as often as
/// strings, so any scalar counts; only null, missing, and empty values
/// are absent.
fn field_text(object: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    let text = coerce_string(object.get(key));
    if text.is_empty() || text == "null" {
        None
    } else {
        Some(text)
    }
}

/// Coerce a value into a list, mapping each entry through `entry_fn`
fn coerce_list<T>(
    value: Option<&serde_json::Value>,
    entry_fn: impl Fn(&serde_json::Value) -> T,
) -> Vec<T> {
    value
        .and_then(serde_json::Value::as_array)
        .map(|entries| entries.iter().map(&entry_fn).collect())
        .unwrap_or_default()
}

/// Flatten one ingredient entry into a human-readable string
///
/// Models sometimes return `{"quantity": "2 cups", "item": "flour"}` style
/// objects instead of plain strings; the recognized key sets are tried in
/// priority order before falling back to a JSON dump.
fn flatten_ingredient(entry: &serde_json::Value) -> String {
    match entry {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(object) => {
            if let Some(item) = field_text(object, "item") {
                let mut text = match field_text(object, "quantity") {
                    Some(quantity) => format!("{quantity} {item}"),
                    None => item,
                };
                if let Some(prep) = field_text(object, "prep") {
                    text.push_str(", ");
                    text.push_str(&prep);
                }
                if let Some(quality) = field_text(object, "quality") {
                    text.push_str(" (");
                    text.push_str(&quality);
                    text.push(')');
                }
                return text;
            }
            if let Some(name) = field_text(object, "name") {
                let mut text = match field_text(object, "amount") {
                    Some(amount) => format!("{amount} {name}"),
                    None => name,
                };
                if let Some(notes) = field_text(object, "notes") {
                    text.push_str(" - ");
                    text.push_str(&notes);
                }
                return text;
            }
            serde_json::to_string(entry).unwrap_or_default()
        }
        other => coerce_string(Some(other)),
    }
}

/// Flatten one instruction entry into a human-readable string
fn flatten_instruction(entry: &serde_json::Value) -> String {
    match entry {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(object) => {
            if let Some(instruction) = field_text(object, "instruction") {
                return match object.get("number").and_then(serde_json::Value::as_i64) {
                    Some(number) => format!("{number}. {instruction}"),
                    None => instruction,
                };
            }
            if let Some(action) = field_text(object, "action") {
                let mut text = action;
                let ingredients: Vec<String> = object
                    .get("ingredients")
                    .and_then(serde_json::Value::as_array)
                    .map(|list| list.iter().map(flatten_ingredient).collect())
                    .unwrap_or_default();
                if !ingredients.is_empty() {
                    text.push_str(" (");
                    text.push_str(&ingredients.join(", "));
                    text.push(')');
                }
                if let Some(duration) = field_text(object, "duration") {
                    text.push_str(" for ");
                    text.push_str(&duration);
                }
                if let Some(note) = field_text(object, "note") {
                    text.push_str(" - ");
                    text.push_str(&note);
                }
                return text;
            }
            for key in ["text", "description", "step"] {
                if let Some(value) = field_text(object, key) {
                    return value;
                }
            }
            serde_json::to_string(entry).unwrap_or_default()
        }
        other => coerce_string(Some(other)),
    }
}

/// Calories arrive as numbers or numeric strings; anything else becomes 0
fn coerce_calories(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => {
            #[allow(clippy::cast_possible_truncation)]
            n.as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .unwrap_or(0)
        }
        Some(serde_json::Value::String(s)) => {
            let digits: String = s
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            #[allow(clippy::cast_possible_truncation)]
            digits.parse::<f64>().map(|f| f.round() as i64).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Macro fields keep their unit suffix; anything missing becomes `"0g"`
fn coerce_macro(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => "0g".to_owned(),
    }
}

fn coerce_nutrition(value: Option<&serde_json::Value>) -> NutritionInfo {
    let object = value.and_then(serde_json::Value::as_object);
    let get = |key: &str| object.and_then(|o| o.get(key));
    NutritionInfo {
        calories: coerce_calories(get("calories")),
        protein: coerce_macro(get("protein")),
        carbs: coerce_macro(get("carbs")),
        fats: coerce_macro(get("fats")),
        fiber: coerce_macro(get("fiber")),
        sugar: coerce_macro(get("sugar")),
    }
}

fn coerce_variation(entry: &serde_json::Value) -> RecipeVariation {
    match entry {
        serde_json::Value::Object(object) => RecipeVariation {
            name: coerce_string(object.get("name")),
            adjustments: coerce_list(object.get("adjustments"), flatten_instruction),
        },
        other => RecipeVariation {
            name: coerce_string(Some(other)),
            adjustments: Vec::new(),
        },
    }
}

fn coerce_recipe(entry: &serde_json::Value) -> Recipe {
    let empty = serde_json::Map::new();
    let object = entry.as_object().unwrap_or(&empty);
    Recipe {
        title: coerce_string(object.get("title")),
        description: coerce_string(object.get("description")),
        ingredients: coerce_list(object.get("ingredients"), flatten_ingredient),
        instructions: coerce_list(object.get("instructions"), flatten_instruction),
        nutrition_info: coerce_nutrition(object.get("nutritionInfo")),
        prep_time: coerce_string(object.get("prepTime")),
        cook_time: coerce_string(object.get("cookTime")),
        servings: coerce_string(object.get("servings")),
        difficulty: coerce_string(object.get("difficulty")),
        chef_tips: coerce_list(object.get("chefTips"), flatten_instruction),
        cultural_context: coerce_string(object.get("culturalContext")),
        variations: coerce_list(object.get("variations"), coerce_variation),
        side_dish_suggestions: coerce_list(
            object.get("sideDishSuggestions"),
            flatten_instruction,
        ),
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Normalize a raw model response into a [`RecipeAnalysis`]
///
/// # Errors
///
/// Typed [`NormalizeError`] variants for empty, unparsable, or
/// schema-invalid responses.
pub fn normalize_recipe_analysis(raw: &str) -> Result<RecipeAnalysis, NormalizeError> {
    let value = repair_and_parse(raw)?;
    let object = value.as_object().ok_or_else(|| {
        NormalizeError::SchemaValidation("top-level JSON value is not an object".to_owned())
    })?;

    Ok(RecipeAnalysis {
        food_name: coerce_string(object.get("foodName")),
        description: coerce_string(object.get("description")),
        tags: coerce_list(object.get("tags"), flatten_instruction),
        recipes: coerce_list(object.get("recipes"), coerce_recipe),
        youtube_videos: Vec::new(),
    })
}

/// Attach up to [`MAX_RELATED_VIDEOS`] related videos to a normalized analysis
///
/// Failures from the video-search collaborator are logged and swallowed;
/// the analysis is returned with an empty video list in that case.
pub async fn enrich_with_videos(analysis: &mut RecipeAnalysis, search: &dyn VideoSearch) {
    if analysis.food_name.is_empty() {
        return;
    }
    match search.search(&analysis.food_name, MAX_RELATED_VIDEOS).await {
        Ok(videos) => {
            analysis.youtube_videos = videos;
            analysis.youtube_videos.truncate(MAX_RELATED_VIDEOS);
        }
        Err(e) => {
            warn!("video enrichment failed, returning analysis without videos: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_with_trailing_comma() {
        let raw = "```json\n{\"foodName\": \"Tacos\", \"tags\": [\"Mexican\"],}\n```";
        let analysis = normalize_recipe_analysis(raw).unwrap();
        assert_eq!(analysis.food_name, "Tacos");
        assert_eq!(analysis.description, "");
        assert_eq!(analysis.tags, vec!["Mexican"]);
        assert!(analysis.recipes.is_empty());
    }

    #[test]
    fn test_prose_wrapped_object() {
        let raw = "Sure! Here is your recipe:\n{\"foodName\": \"Pho\"}\nEnjoy!";
        let analysis = normalize_recipe_analysis(raw).unwrap();
        assert_eq!(analysis.food_name, "Pho");
    }

    #[test]
    fn test_no_braces_is_unparsable_not_a_panic() {
        let error = normalize_recipe_analysis("I could not identify the dish.").unwrap_err();
        assert!(matches!(error, NormalizeError::UnparsableJson(_)));
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(
            normalize_recipe_analysis("   \n  "),
            Err(NormalizeError::EmptyResponse)
        ));
    }

    #[test]
    fn test_aggressive_repair_quotes_bare_keys_and_single_quotes() {
        let raw = "{foodName: 'Ramen', tags: ['Japanese', 'Soup',],}";
        let analysis = normalize_recipe_analysis(raw).unwrap();
        assert_eq!(analysis.food_name, "Ramen");
        assert_eq!(analysis.tags, vec!["Japanese", "Soup"]);
    }

    #[test]
    fn test_top_level_array_is_schema_invalid() {
        let error = normalize_recipe_analysis("[1, 2, 3]").unwrap_err();
        assert!(matches!(error, NormalizeError::SchemaValidation(_)));
    }

    #[test]
    fn test_ingredient_object_flattening() {
        let quantity_form = serde_json::json!({
            "quantity": "2 cups", "item": "flour", "prep": "sifted", "quality": "organic"
        });
        assert_eq!(
            flatten_ingredient(&quantity_form),
            "2 cups flour, sifted (organic)"
        );

        let null_prep = serde_json::json!({ "quantity": "1", "item": "egg", "prep": "null" });
        assert_eq!(flatten_ingredient(&null_prep), "1 egg");

        let amount_form = serde_json::json!({ "amount": "100g", "name": "butter", "notes": "cold" });
        assert_eq!(flatten_ingredient(&amount_form), "100g butter - cold");

        let unknown_form = serde_json::json!({ "weird": true });
        assert_eq!(flatten_ingredient(&unknown_form), "{\"weird\":true}");
    }

    #[test]
    fn test_numeric_fields_survive_flattening() {
        let numeric_quantity = serde_json::json!({ "quantity": 2, "item": "eggs" });
        assert_eq!(flatten_ingredient(&numeric_quantity), "2 eggs");

        let numeric_amount = serde_json::json!({ "amount": 100, "name": "grams of flour" });
        assert_eq!(flatten_ingredient(&numeric_amount), "100 grams of flour");

        let numeric_duration = serde_json::json!({ "action": "Whisk", "duration": 5 });
        assert_eq!(flatten_instruction(&numeric_duration), "Whisk for 5");
    }

    #[test]
    fn test_instruction_object_flattening() {
        let numbered = serde_json::json!({ "number": 2, "instruction": "Simmer the broth" });
        assert_eq!(flatten_instruction(&numbered), "2. Simmer the broth");

        let action_form = serde_json::json!({
            "action": "Saute", "ingredients": ["onion", "garlic"], "duration": "5 minutes"
        });
        assert_eq!(
            flatten_instruction(&action_form),
            "Saute (onion, garlic) for 5 minutes"
        );

        let text_form = serde_json::json!({ "text": "Serve hot" });
        assert_eq!(flatten_instruction(&text_form), "Serve hot");
    }

    #[test]
    fn test_nutrition_coercion() {
        let raw = r#"{
            "foodName": "Salad",
            "recipes": [{
                "title": "Greek Salad",
                "ingredients": "not-a-list",
                "nutritionInfo": { "calories": "350 kcal", "protein": "12g" }
            }]
        }"#;
        let analysis = normalize_recipe_analysis(raw).unwrap();
        let recipe = &analysis.recipes[0];
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.nutrition_info.calories, 350);
        assert_eq!(recipe.nutrition_info.protein, "12g");
        assert_eq!(recipe.nutrition_info.carbs, "0g");
    }

    #[test]
    fn test_exactly_two_parse_attempts() {
        // Unrepairable even by the aggressive pass: parse must fail after
        // the second attempt rather than loop.
        let error = repair_and_parse("{foodName: 'Tacos', {{{").unwrap_err();
        assert!(matches!(error, NormalizeError::UnparsableJson(_)));
    }
}
