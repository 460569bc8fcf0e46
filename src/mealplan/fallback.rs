// ABOUTME: Deterministic template-based meal plan generator
// ABOUTME: Always succeeds; serves as the recovery path when the AI plan is unusable
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Template Fallback Generator
//!
//! Builds a complete plan from a curated template table keyed by
//! `(cuisine, meal type)`. Cuisine selection is random but prefers pairs not
//! yet used anywhere in the plan; once every preferred cuisine has supplied
//! a given meal type, the used-pair tracking resets for that meal type only.
//! This generator has no failure path of its own.

use chrono::{Days, Utc};
use rand::seq::SliceRandom;
use std::collections::HashSet;

use super::PlanPreferences;
use crate::models::{
    DailyNutrition, GroceryCategory, Meal, MealMacros, MealPlan, MealPlanDay, NutritionSummary,
};

/// One curated meal template
struct MealTemplate {
    cuisine: &'static str,
    meal_type: &'static str,
    name: &'static str,
    calories: i64,
    ingredients: &'static [&'static str],
    instructions: &'static str,
    protein: &'static str,
    carbs: &'static str,
    fats: &'static str,
}

/// Fixed grocery categories, in display order
const GROCERY_CATEGORIES: [&str; 7] = [
    "Proteins",
    "Grains",
    "Fruits & Vegetables",
    "Dairy",
    "Herbs & Spices",
    "Oils & Condiments",
    "Other",
];

/// Keywords mapping an ingredient string to a grocery category
const CATEGORY_KEYWORDS: [(&str, &[&str]); 6] = [
    (
        "Proteins",
        &[
            "chicken", "beef", "pork", "fish", "salmon", "shrimp", "tofu", "egg", "turkey",
            "lentil", "chickpea", "bean", "paneer",
        ],
    ),
    (
        "Grains",
        &[
            "rice", "pasta", "bread", "tortilla", "noodle", "quinoa", "oat", "flour", "couscous",
            "pita",
        ],
    ),
    (
        "Fruits & Vegetables",
        &[
            "tomato", "onion", "garlic", "spinach", "lettuce", "cucumber", "avocado", "banana",
            "apple", "berr", "lemon", "lime", "carrot", "broccoli", "mushroom", "potato",
            "zucchini", "mango", "pea", "pepper", "eggplant",
        ],
    ),
    (
        "Dairy",
        &[
            "milk", "cheese", "yogurt", "butter", "cream", "mozzarella", "parmesan", "ghee",
            "feta",
        ],
    ),
    (
        "Herbs & Spices",
        &[
            "basil", "cilantro", "parsley", "oregano", "cumin", "turmeric", "paprika", "ginger",
            "chili", "curry", "masala", "cinnamon", "coriander", "mint", "salt",
        ],
    ),
    (
        "Oils & Condiments",
        &[
            "oil", "vinegar", "soy sauce", "sauce", "honey", "mustard", "salsa", "dressing",
            "tahini", "miso",
        ],
    ),
];

const TEMPLATES: &[MealTemplate] = &[
    // Italian
    MealTemplate {
        cuisine: "Italian",
        meal_type: "Breakfast",
        name: "Ricotta Toast with Berries",
        calories: 380,
        ingredients: &["sourdough bread", "ricotta cheese", "mixed berries", "honey"],
        instructions: "Toast the bread, spread ricotta, top with berries and a drizzle of honey.",
        protein: "15g",
        carbs: "48g",
        fats: "14g",
    },
    MealTemplate {
        cuisine: "Italian",
        meal_type: "Lunch",
        name: "Caprese Panini",
        calories: 520,
        ingredients: &["ciabatta bread", "mozzarella", "tomato", "basil", "olive oil"],
        instructions: "Layer mozzarella, tomato, and basil on ciabatta; press until golden.",
        protein: "24g",
        carbs: "52g",
        fats: "24g",
    },
    MealTemplate {
        cuisine: "Italian",
        meal_type: "Snack",
        name: "Marinated Olives and Parmesan",
        calories: 210,
        ingredients: &["olives", "parmesan", "olive oil", "oregano"],
        instructions: "Toss olives with oil and oregano; serve with parmesan shavings.",
        protein: "8g",
        carbs: "6g",
        fats: "17g",
    },
    MealTemplate {
        cuisine: "Italian",
        meal_type: "Dinner",
        name: "Chicken Piccata with Spaghetti",
        calories: 640,
        ingredients: &["chicken breast", "spaghetti pasta", "lemon", "capers", "butter"],
        instructions: "Pan-fry the chicken, deglaze with lemon and capers, toss with spaghetti.",
        protein: "42g",
        carbs: "58g",
        fats: "24g",
    },
    // Indian
    MealTemplate {
        cuisine: "Indian",
        meal_type: "Breakfast",
        name: "Masala Oats",
        calories: 340,
        ingredients: &["rolled oats", "onion", "tomato", "turmeric", "cumin"],
        instructions: "Saute onion and tomato with spices, stir in oats and water, simmer.",
        protein: "12g",
        carbs: "54g",
        fats: "8g",
    },
    MealTemplate {
        cuisine: "Indian",
        meal_type: "Lunch",
        name: "Chana Masala with Rice",
        calories: 560,
        ingredients: &["chickpeas", "basmati rice", "onion", "garam masala", "ginger"],
        instructions: "Simmer chickpeas in a spiced tomato-onion gravy; serve over rice.",
        protein: "20g",
        carbs: "86g",
        fats: "12g",
    },
    MealTemplate {
        cuisine: "Indian",
        meal_type: "Snack",
        name: "Spiced Yogurt with Cucumber",
        calories: 160,
        ingredients: &["yogurt", "cucumber", "cumin", "mint"],
        instructions: "Whisk yogurt with cumin, fold in cucumber and mint, chill.",
        protein: "9g",
        carbs: "14g",
        fats: "6g",
    },
    MealTemplate {
        cuisine: "Indian",
        meal_type: "Dinner",
        name: "Paneer Tikka with Naan",
        calories: 620,
        ingredients: &["paneer", "naan bread", "yogurt", "turmeric", "bell pepper"],
        instructions: "Marinate paneer in spiced yogurt, grill with peppers, serve with naan.",
        protein: "28g",
        carbs: "60g",
        fats: "28g",
    },
    // Mexican
    MealTemplate {
        cuisine: "Mexican",
        meal_type: "Breakfast",
        name: "Huevos Rancheros",
        calories: 420,
        ingredients: &["eggs", "corn tortilla", "salsa", "black beans", "avocado"],
        instructions: "Fry eggs, place on warm tortillas with beans, top with salsa and avocado.",
        protein: "20g",
        carbs: "38g",
        fats: "20g",
    },
    MealTemplate {
        cuisine: "Mexican",
        meal_type: "Lunch",
        name: "Chicken Burrito Bowl",
        calories: 580,
        ingredients: &["chicken breast", "rice", "black beans", "corn", "lime"],
        instructions: "Layer rice, beans, grilled chicken, and corn; finish with lime.",
        protein: "38g",
        carbs: "66g",
        fats: "16g",
    },
    MealTemplate {
        cuisine: "Mexican",
        meal_type: "Snack",
        name: "Guacamole with Tortilla Chips",
        calories: 260,
        ingredients: &["avocado", "lime", "cilantro", "tortilla chips"],
        instructions: "Mash avocado with lime and cilantro; serve with chips.",
        protein: "4g",
        carbs: "24g",
        fats: "18g",
    },
    MealTemplate {
        cuisine: "Mexican",
        meal_type: "Dinner",
        name: "Fish Tacos",
        calories: 540,
        ingredients: &["white fish", "corn tortilla", "cabbage", "lime", "crema"],
        instructions: "Sear spiced fish, pile into tortillas with slaw, drizzle with crema.",
        protein: "34g",
        carbs: "48g",
        fats: "22g",
    },
    // Japanese
    MealTemplate {
        cuisine: "Japanese",
        meal_type: "Breakfast",
        name: "Tamagoyaki with Rice",
        calories: 360,
        ingredients: &["eggs", "rice", "soy sauce", "scallion"],
        instructions: "Roll thin omelet layers into tamagoyaki; serve over rice.",
        protein: "16g",
        carbs: "44g",
        fats: "12g",
    },
    MealTemplate {
        cuisine: "Japanese",
        meal_type: "Lunch",
        name: "Salmon Teriyaki Bowl",
        calories: 560,
        ingredients: &["salmon", "rice", "soy sauce", "honey", "broccoli"],
        instructions: "Glaze seared salmon with teriyaki; serve on rice with broccoli.",
        protein: "36g",
        carbs: "58g",
        fats: "18g",
    },
    MealTemplate {
        cuisine: "Japanese",
        meal_type: "Snack",
        name: "Edamame with Sea Salt",
        calories: 150,
        ingredients: &["edamame beans", "salt"],
        instructions: "Boil edamame pods, drain, sprinkle with salt.",
        protein: "12g",
        carbs: "10g",
        fats: "5g",
    },
    MealTemplate {
        cuisine: "Japanese",
        meal_type: "Dinner",
        name: "Chicken Katsu Curry",
        calories: 680,
        ingredients: &["chicken breast", "rice", "curry sauce", "panko", "carrot"],
        instructions: "Bread and fry the chicken, slice, and serve over rice with curry sauce.",
        protein: "38g",
        carbs: "74g",
        fats: "24g",
    },
    // Mediterranean
    MealTemplate {
        cuisine: "Mediterranean",
        meal_type: "Breakfast",
        name: "Greek Yogurt Parfait",
        calories: 330,
        ingredients: &["greek yogurt", "honey", "walnuts", "mixed berries"],
        instructions: "Layer yogurt with berries and walnuts, drizzle with honey.",
        protein: "18g",
        carbs: "36g",
        fats: "12g",
    },
    MealTemplate {
        cuisine: "Mediterranean",
        meal_type: "Lunch",
        name: "Falafel Pita",
        calories: 520,
        ingredients: &["falafel", "pita bread", "tahini", "cucumber", "tomato"],
        instructions: "Stuff warm pita with falafel and vegetables, dress with tahini.",
        protein: "18g",
        carbs: "62g",
        fats: "22g",
    },
    MealTemplate {
        cuisine: "Mediterranean",
        meal_type: "Snack",
        name: "Hummus with Vegetables",
        calories: 190,
        ingredients: &["hummus", "carrot", "cucumber", "olive oil"],
        instructions: "Serve hummus drizzled with oil alongside vegetable sticks.",
        protein: "6g",
        carbs: "18g",
        fats: "11g",
    },
    MealTemplate {
        cuisine: "Mediterranean",
        meal_type: "Dinner",
        name: "Lemon Herb Fish with Couscous",
        calories: 560,
        ingredients: &["white fish", "couscous", "lemon", "parsley", "olive oil"],
        instructions: "Roast fish with lemon and herbs; serve over fluffed couscous.",
        protein: "36g",
        carbs: "54g",
        fats: "20g",
    },
    // American
    MealTemplate {
        cuisine: "American",
        meal_type: "Breakfast",
        name: "Veggie Scramble with Toast",
        calories: 390,
        ingredients: &["eggs", "spinach", "mushroom", "whole wheat bread", "butter"],
        instructions: "Scramble eggs with vegetables; serve with buttered toast.",
        protein: "21g",
        carbs: "34g",
        fats: "18g",
    },
    MealTemplate {
        cuisine: "American",
        meal_type: "Lunch",
        name: "Turkey Club Sandwich",
        calories: 540,
        ingredients: &["turkey breast", "whole wheat bread", "lettuce", "tomato", "mustard"],
        instructions: "Stack turkey and vegetables on toasted bread with mustard.",
        protein: "32g",
        carbs: "50g",
        fats: "20g",
    },
    MealTemplate {
        cuisine: "American",
        meal_type: "Snack",
        name: "Apple with Peanut Butter",
        calories: 220,
        ingredients: &["apple", "peanut butter"],
        instructions: "Slice the apple and serve with peanut butter for dipping.",
        protein: "7g",
        carbs: "26g",
        fats: "11g",
    },
    MealTemplate {
        cuisine: "American",
        meal_type: "Dinner",
        name: "Grilled Steak with Roasted Potatoes",
        calories: 680,
        ingredients: &["beef sirloin", "potato", "rosemary", "olive oil", "broccoli"],
        instructions: "Grill the steak to preference; roast potatoes and broccoli alongside.",
        protein: "44g",
        carbs: "46g",
        fats: "32g",
    },
];

/// Numeric prefix of a macro string like `"25g"`; anything else counts as 0
fn numeric_prefix(text: &str) -> f64 {
    let digits: String = text
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

fn format_grams(value: f64) -> String {
    format!("{}g", value.round())
}

/// Cuisines from the preference list that exist in the template table,
/// falling back to every known cuisine when none match
fn candidate_cuisines(preferences: &PlanPreferences) -> Vec<&'static str> {
    let known: Vec<&'static str> = {
        let mut seen = Vec::new();
        for template in TEMPLATES {
            if !seen.contains(&template.cuisine) {
                seen.push(template.cuisine);
            }
        }
        seen
    };

    let matched: Vec<&'static str> = known
        .iter()
        .copied()
        .filter(|cuisine| {
            preferences
                .cuisine_preferences
                .iter()
                .any(|preferred| preferred.eq_ignore_ascii_case(cuisine))
        })
        .collect();

    if matched.is_empty() {
        known
    } else {
        matched
    }
}

fn find_template(cuisine: &str, meal_type: &str) -> Option<&'static MealTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.cuisine == cuisine && t.meal_type == meal_type)
}

/// Pick a cuisine for one meal slot, preferring unused `(cuisine, meal type)`
/// pairs and resetting the tracking for this meal type when all are used
fn pick_cuisine(
    cuisines: &[&'static str],
    meal_type: &str,
    used: &mut HashSet<(String, String)>,
    rng: &mut impl rand::Rng,
) -> &'static str {
    let fresh: Vec<&'static str> = cuisines
        .iter()
        .copied()
        .filter(|cuisine| !used.contains(&((*cuisine).to_owned(), meal_type.to_owned())))
        .collect();

    let chosen = if fresh.is_empty() {
        used.retain(|(_, used_meal_type)| used_meal_type != meal_type);
        cuisines.choose(rng).copied().unwrap_or("American")
    } else {
        fresh.choose(rng).copied().unwrap_or("American")
    };

    used.insert((chosen.to_owned(), meal_type.to_owned()));
    chosen
}

/// Bucket an ingredient into one of the fixed grocery categories
fn grocery_category(ingredient: &str) -> &'static str {
    let lowered = ingredient.to_lowercase();
    for (category, keywords) in &CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return category;
        }
    }
    "Other"
}

/// Generate a complete plan from templates alone
///
/// Always succeeds for any valid preference input.
#[must_use]
pub fn generate_plan(preferences: &PlanPreferences) -> MealPlan {
    let mut rng = rand::thread_rng();
    let cuisines = candidate_cuisines(preferences);
    let meal_types = preferences.meal_types();
    let start_date = Utc::now().date_naive();

    let mut used_pairs: HashSet<(String, String)> = HashSet::new();
    let mut grocery: Vec<(String, Vec<String>)> = GROCERY_CATEGORIES
        .iter()
        .map(|category| ((*category).to_owned(), Vec::new()))
        .collect();

    let mut total_calories = 0_i64;
    let mut total_protein = 0.0;
    let mut total_carbs = 0.0;
    let mut total_fats = 0.0;

    let mut days = Vec::with_capacity(preferences.duration_days());
    for day_index in 0..preferences.duration_days() {
        let date = start_date
            .checked_add_days(Days::new(day_index as u64))
            .unwrap_or(start_date);

        let mut meals = Vec::with_capacity(meal_types.len());
        let mut day_calories = 0_i64;
        let mut day_protein = 0.0;
        let mut day_carbs = 0.0;
        let mut day_fats = 0.0;

        for meal_type in meal_types {
            let cuisine = pick_cuisine(&cuisines, meal_type, &mut used_pairs, &mut rng);
            let Some(template) = find_template(cuisine, meal_type) else {
                continue;
            };

            day_calories += template.calories;
            day_protein += numeric_prefix(template.protein);
            day_carbs += numeric_prefix(template.carbs);
            day_fats += numeric_prefix(template.fats);

            for ingredient in template.ingredients {
                let category = grocery_category(ingredient);
                if let Some((_, items)) = grocery.iter_mut().find(|(name, _)| name == category) {
                    if !items.iter().any(|item| item == ingredient) {
                        items.push((*ingredient).to_owned());
                    }
                }
            }

            meals.push(Meal {
                meal_type: (*meal_type).to_owned(),
                name: template.name.to_owned(),
                cuisine: cuisine.to_owned(),
                calories: template.calories,
                ingredients: template.ingredients.iter().map(|i| (*i).to_owned()).collect(),
                instructions: template.instructions.to_owned(),
                macros: MealMacros {
                    protein: template.protein.to_owned(),
                    carbs: template.carbs.to_owned(),
                    fats: template.fats.to_owned(),
                },
            });
        }

        total_calories += day_calories;
        total_protein += day_protein;
        total_carbs += day_carbs;
        total_fats += day_fats;

        days.push(MealPlanDay {
            date: date.format("%Y-%m-%d").to_string(),
            meals,
            daily_nutrition: DailyNutrition {
                calories: day_calories,
                protein: format_grams(day_protein),
                carbs: format_grams(day_carbs),
                fats: format_grams(day_fats),
            },
        });
    }

    let day_count = days.len().max(1) as i64;
    let average_calories = total_calories / day_count;
    #[allow(clippy::cast_precision_loss)]
    let average_protein = total_protein / day_count as f64;
    #[allow(clippy::cast_precision_loss)]
    let average_carbs = total_carbs / day_count as f64;
    #[allow(clippy::cast_precision_loss)]
    let average_fats = total_fats / day_count as f64;

    let goal = if preferences.health_goal.is_empty() {
        "balanced nutrition".to_owned()
    } else {
        preferences.health_goal.clone()
    };

    let recommendations = vec![
        format!(
            "This plan averages {average_calories} calories per day, sized for your goal of {goal}."
        ),
        format!(
            "Aim for about {} of protein daily to support {goal}.",
            format_grams(average_protein)
        ),
        "Drink water throughout the day and keep meal times consistent.".to_owned(),
        "Adjust portion sizes up or down if your energy levels change mid-plan.".to_owned(),
    ];

    MealPlan {
        days,
        grocery_list: grocery
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| GroceryCategory { category, items })
            .collect(),
        nutrition_summary: NutritionSummary {
            average_daily_calories: average_calories,
            average_daily_protein: format_grams(average_protein),
            average_daily_carbs: format_grams(average_carbs),
            average_daily_fats: format_grams(average_fats),
            recommendations,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferences(duration: &str, meals: u8, cuisines: &[&str]) -> PlanPreferences {
        PlanPreferences {
            duration: duration.to_owned(),
            meals_per_day: meals,
            cuisine_preferences: cuisines.iter().map(|c| (*c).to_owned()).collect(),
            health_goal: "muscle gain".to_owned(),
        }
    }

    #[test]
    fn test_plan_shape_matches_preferences() {
        let plan = generate_plan(&preferences("2-weeks", 4, &["Italian", "Indian"]));
        assert_eq!(plan.days.len(), 14);
        for day in &plan.days {
            assert_eq!(day.meals.len(), 4);
            assert_eq!(day.meals[0].meal_type, "Breakfast");
            assert_eq!(day.meals[3].meal_type, "Dinner");
            assert!(["Italian", "Indian"].contains(&day.meals[0].cuisine.as_str()));
        }
    }

    #[test]
    fn test_daily_nutrition_sums_template_macros() {
        let plan = generate_plan(&preferences("1-week", 2, &["Mexican"]));
        for day in &plan.days {
            let expected: i64 = day.meals.iter().map(|m| m.calories).sum();
            assert_eq!(day.daily_nutrition.calories, expected);
            assert!(day.daily_nutrition.protein.ends_with('g'));
        }
        assert!(plan.nutrition_summary.average_daily_calories > 0);
    }

    #[test]
    fn test_grocery_categories_fixed_and_deduped() {
        let plan = generate_plan(&preferences("4-weeks", 4, &["Italian", "Japanese"]));
        for category in &plan.grocery_list {
            assert!(GROCERY_CATEGORIES.contains(&category.category.as_str()));
            let mut sorted = category.items.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), category.items.len());
        }
    }

    #[test]
    fn test_unknown_cuisine_falls_back_to_full_table() {
        let plan = generate_plan(&preferences("1-week", 2, &["Martian"]));
        assert_eq!(plan.days.len(), 7);
        assert!(plan.days.iter().all(|day| day.meals.len() == 2));
    }

    #[test]
    fn test_recommendations_reference_goal() {
        let plan = generate_plan(&preferences("1-week", 2, &["Indian"]));
        let recommendations = &plan.nutrition_summary.recommendations;
        assert!(recommendations.len() >= 3 && recommendations.len() <= 4);
        assert!(recommendations.iter().any(|r| r.contains("muscle gain")));
    }

    #[test]
    fn test_ingredient_bucketing() {
        assert_eq!(grocery_category("chicken breast"), "Proteins");
        assert_eq!(grocery_category("basmati rice"), "Grains");
        assert_eq!(grocery_category("olive oil"), "Oils & Condiments");
        assert_eq!(grocery_category("dark chocolate"), "Other");
    }
}
