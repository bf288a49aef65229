use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{GenerateSaveRequest, RecipeFilters, RecipeInput};
use super::repo::{self, Recipe};
use crate::ai::AiError;
use crate::error::ApiError;
use crate::state::AppState;

const POPULAR_MIN_RATING: f64 = 4.0;
const RECENT_LIMIT: usize = 10;

/// Fuzzy ingredient search. An absent body means "no filter" (all recipes);
/// an explicit list that is empty or all-blank returns nothing.
pub async fn search_by_ingredients(
    db: &PgPool,
    queries: Option<Vec<String>>,
) -> anyhow::Result<Vec<Recipe>> {
    let all = repo::find_all(db).await?;
    Ok(match queries {
        None => all,
        Some(queries) => rank_by_ingredients(all, &queries),
    })
}

/// Rank recipes by how many of their ingredients substring-match a query
/// term, descending. Each recipe ingredient counts at most once even when
/// several queries hit it; recipes without a single match are dropped.
/// The sort is stable, so ties keep store order.
pub fn rank_by_ingredients(recipes: Vec<Recipe>, queries: &[String]) -> Vec<Recipe> {
    let queries: Vec<String> = queries
        .iter()
        .filter(|q| !q.trim().is_empty())
        .map(|q| q.to_lowercase())
        .collect();
    if queries.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, Recipe)> = recipes
        .into_iter()
        .filter_map(|recipe| {
            let count = recipe
                .ingredients
                .iter()
                .filter(|ingredient| {
                    let lower = ingredient.to_lowercase();
                    queries.iter().any(|q| lower.contains(q))
                })
                .count();
            (count > 0).then_some((count, recipe))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, recipe)| recipe).collect()
}

pub async fn search_with_filters(
    db: &PgPool,
    filters: &RecipeFilters,
) -> anyhow::Result<Vec<Recipe>> {
    let all = repo::find_all(db).await?;
    Ok(apply_filters(all, filters))
}

/// AND-combine every supplied filter. A recipe missing the relevant value
/// (no nutrition, no calories subfield, no prep time) passes that filter;
/// absence never fails a constraint.
pub fn apply_filters(recipes: Vec<Recipe>, filters: &RecipeFilters) -> Vec<Recipe> {
    recipes
        .into_iter()
        .filter(|recipe| matches_filters(recipe, filters))
        .collect()
}

fn matches_filters(recipe: &Recipe, filters: &RecipeFilters) -> bool {
    if let Some(max_calories) = filters.max_calories {
        if let Some(calories) = recipe.nutrition.as_ref().and_then(|n| n.calories) {
            if calories > max_calories {
                return false;
            }
        }
    }
    if let Some(min_protein) = filters.min_protein {
        if let Some(protein) = recipe.nutrition.as_ref().and_then(|n| n.protein) {
            if protein < min_protein {
                return false;
            }
        }
    }
    if let Some(diet_type) = filters.diet_type.as_deref() {
        let diet_type = diet_type.to_lowercase();
        if !recipe.tags.iter().any(|tag| tag.to_lowercase() == diet_type) {
            return false;
        }
    }
    if let Some(max_prep) = filters.max_prep_time {
        if let Some(prep) = recipe.prep_time_minutes {
            if prep > max_prep {
                return false;
            }
        }
    }
    if let Some(max_cook) = filters.max_cook_time {
        if let Some(cook) = recipe.cook_time_minutes {
            if cook > max_cook {
                return false;
            }
        }
    }
    true
}

pub async fn generate_from_ai(state: &AppState, ingredients: &[String]) -> Result<String, AiError> {
    state.ai.generate_recipes(ingredients).await
}

/// Wrap already-generated markdown into a saved recipe. The markdown is
/// stored verbatim as the single instruction entry.
pub async fn save_generated(db: &PgPool, payload: GenerateSaveRequest) -> anyhow::Result<Recipe> {
    let now = OffsetDateTime::now_utc();
    let recipe = Recipe {
        id: Uuid::new_v4(),
        title: "Generated Recipe".into(),
        description: Some("AI generated recipe".into()),
        image_url: None,
        prep_time_minutes: None,
        cook_time_minutes: None,
        servings: None,
        ingredients: Json(payload.ingredients),
        instructions: Json(vec![payload.recipe_text]),
        nutrition: None,
        tags: Json(Vec::new()),
        source: None,
        rating: None,
        review_count: None,
        is_saved: true,
        created_at: Some(now),
        updated_at: Some(now),
    };
    repo::save(db, &recipe).await
}

pub async fn save_recipe(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let Some(mut recipe) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    recipe.is_saved = true;
    recipe.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &recipe).await?))
}

pub async fn unsave_recipe(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let Some(mut recipe) = repo::find_by_id(db, id).await? else {
        return Ok(false);
    };
    recipe.is_saved = false;
    recipe.updated_at = Some(OffsetDateTime::now_utc());
    repo::save(db, &recipe).await?;
    Ok(true)
}

pub async fn popular(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    repo::find_by_min_rating(db, POPULAR_MIN_RATING).await
}

pub async fn recent(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    let all = repo::find_all(db).await?;
    Ok(recent_sorted(all))
}

/// Top 10 by created-at descending; recipes without a timestamp sort last.
pub fn recent_sorted(mut recipes: Vec<Recipe>) -> Vec<Recipe> {
    recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recipes.truncate(RECENT_LIMIT);
    recipes
}

pub async fn create(db: &PgPool, input: RecipeInput) -> Result<Recipe, ApiError> {
    validate(&input)?;
    let now = OffsetDateTime::now_utc();
    let recipe = from_input(Uuid::new_v4(), input, Some(now), Some(now));
    Ok(repo::save(db, &recipe).await?)
}

/// Full replace; the original created-at is preserved, updated-at re-stamped.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: RecipeInput,
) -> Result<Option<Recipe>, ApiError> {
    validate(&input)?;
    let Some(existing) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    let recipe = from_input(
        id,
        input,
        existing.created_at,
        Some(OffsetDateTime::now_utc()),
    );
    Ok(Some(repo::save(db, &recipe).await?))
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    if !repo::exists_by_id(db, id).await? {
        return Ok(false);
    }
    repo::delete_by_id(db, id).await?;
    Ok(true)
}

fn from_input(
    id: Uuid,
    input: RecipeInput,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
) -> Recipe {
    Recipe {
        id,
        title: input.title,
        description: input.description,
        image_url: input.image_url,
        prep_time_minutes: input.prep_time_minutes,
        cook_time_minutes: input.cook_time_minutes,
        servings: input.servings,
        ingredients: Json(input.ingredients),
        instructions: Json(input.instructions),
        nutrition: input.nutrition.map(Json),
        tags: Json(input.tags),
        source: input.source,
        rating: input.rating,
        review_count: input.review_count,
        is_saved: input.is_saved.unwrap_or(false),
        created_at,
        updated_at,
    }
}

fn validate(input: &RecipeInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }
    for (label, value) in [
        ("prepTimeMinutes", input.prep_time_minutes),
        ("cookTimeMinutes", input.cook_time_minutes),
    ] {
        if matches!(value, Some(v) if v < 0) {
            return Err(ApiError::Validation(format!("{label} must be >= 0")));
        }
    }
    if matches!(input.rating, Some(r) if !(0.0..=5.0).contains(&r)) {
        return Err(ApiError::Validation("rating must lie in [0, 5]".into()));
    }
    if let Some(nutrition) = &input.nutrition {
        let fields = [
            ("calories", nutrition.calories),
            ("protein", nutrition.protein),
            ("carbs", nutrition.carbs),
            ("fat", nutrition.fat),
            ("fiber", nutrition.fiber),
            ("sugar", nutrition.sugar),
            ("sodium", nutrition.sodium),
        ];
        for (label, value) in fields {
            if matches!(value, Some(v) if v < 0.0) {
                return Err(ApiError::Validation(format!(
                    "nutrition.{label} must be >= 0"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::repo::NutritionInfo;
    use time::macros::datetime;

    fn recipe(title: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            image_url: None,
            prep_time_minutes: None,
            cook_time_minutes: None,
            servings: None,
            ingredients: Json(ingredients.iter().map(|s| s.to_string()).collect()),
            instructions: Json(Vec::new()),
            nutrition: None,
            tags: Json(Vec::new()),
            source: None,
            rating: None,
            review_count: None,
            is_saved: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn blank_queries_return_nothing() {
        let recipes = vec![recipe("pasta", &["tomato"])];
        assert!(rank_by_ingredients(recipes.clone(), &[]).is_empty());
        assert!(rank_by_ingredients(recipes, &["".into(), " ".into()]).is_empty());
    }

    #[test]
    fn ranks_by_distinct_matching_ingredients() {
        let rich = recipe("rich", &["tomato", "onion", "tomato sauce"]);
        let poor = recipe("poor", &["tomato"]);
        let none = recipe("none", &["flour"]);

        let ranked = rank_by_ingredients(
            vec![poor.clone(), none, rich.clone()],
            &["tomato".into()],
        );

        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        // "rich" has two ingredient entries containing "tomato", so it wins
        assert_eq!(titles, vec!["rich", "poor"]);
    }

    #[test]
    fn each_ingredient_counts_once_across_queries() {
        let single = recipe("single", &["tomato sauce"]);
        let double = recipe("double", &["tomato", "sauce jar"]);

        // both queries hit "tomato sauce", but it still counts as one match
        let ranked = rank_by_ingredients(
            vec![single, double],
            &["tomato".into(), "sauce".into()],
        );
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["double", "single"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let r = recipe("salad", &["Cherry Tomatoes"]);
        assert_eq!(rank_by_ingredients(vec![r], &["TOMATO".into()]).len(), 1);
    }

    #[test]
    fn filters_pass_when_value_is_absent() {
        let no_nutrition = recipe("no-nutrition", &[]);
        let mut partial = recipe("partial", &[]);
        partial.nutrition = Some(Json(NutritionInfo {
            protein: Some(20.0),
            ..NutritionInfo::default()
        }));

        let filters = RecipeFilters {
            max_calories: Some(300.0),
            min_protein: Some(10.0),
            max_prep_time: Some(30),
            ..RecipeFilters::default()
        };

        // no nutrition and no calories subfield both pass the calorie cap
        let kept = apply_filters(vec![no_nutrition, partial], &filters);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn filters_and_combine() {
        let mut lean = recipe("lean", &[]);
        lean.nutrition = Some(Json(NutritionInfo {
            calories: Some(250.0),
            protein: Some(30.0),
            ..NutritionInfo::default()
        }));
        lean.prep_time_minutes = Some(10);

        let mut heavy = recipe("heavy", &[]);
        heavy.nutrition = Some(Json(NutritionInfo {
            calories: Some(900.0),
            protein: Some(30.0),
            ..NutritionInfo::default()
        }));

        let filters = RecipeFilters {
            max_calories: Some(300.0),
            min_protein: Some(10.0),
            ..RecipeFilters::default()
        };
        let kept = apply_filters(vec![lean, heavy], &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "lean");
    }

    #[test]
    fn diet_type_matches_tags_case_insensitively() {
        let mut vegan = recipe("vegan", &[]);
        vegan.tags = Json(vec!["vegan".into(), "quick".into()]);
        let plain = recipe("plain", &[]);

        let filters = RecipeFilters {
            diet_type: Some("Vegan".into()),
            ..RecipeFilters::default()
        };
        let kept = apply_filters(vec![vegan, plain], &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "vegan");
    }

    #[test]
    fn recent_sorts_descending_with_missing_timestamps_last() {
        let mut old = recipe("old", &[]);
        old.created_at = Some(datetime!(2024-01-01 00:00 UTC));
        let mut new = recipe("new", &[]);
        new.created_at = Some(datetime!(2025-06-01 00:00 UTC));
        let undated = recipe("undated", &[]);

        let sorted = recent_sorted(vec![old, undated, new]);
        let titles: Vec<&str> = sorted.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
    }

    #[test]
    fn recent_caps_at_ten() {
        let many: Vec<Recipe> = (0..15)
            .map(|i| {
                let mut r = recipe(&format!("r{i}"), &[]);
                r.created_at = Some(datetime!(2025-01-01 00:00 UTC) + time::Duration::days(i));
                r
            })
            .collect();
        let sorted = recent_sorted(many);
        assert_eq!(sorted.len(), 10);
        assert_eq!(sorted[0].title, "r14");
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let mut input = RecipeInput {
            title: "ok".into(),
            description: None,
            image_url: None,
            prep_time_minutes: Some(-5),
            cook_time_minutes: None,
            servings: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            nutrition: None,
            tags: Vec::new(),
            source: None,
            rating: None,
            review_count: None,
            is_saved: None,
        };
        assert!(validate(&input).is_err());

        input.prep_time_minutes = Some(5);
        input.rating = Some(5.5);
        assert!(validate(&input).is_err());

        input.rating = Some(4.5);
        assert!(validate(&input).is_ok());
    }

    #[tokio::test]
    async fn generate_passes_through_ai_client() {
        let state = AppState::fake();
        let text = generate_from_ai(&state, &["tomato".into(), "basil".into()])
            .await
            .unwrap();
        assert!(text.contains("tomato, basil"));
    }
}
