use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub ingredients: Json<Vec<String>>,
    pub instructions: Json<Vec<String>>,
    pub nutrition: Option<Json<NutritionInfo>>,
    pub tags: Json<Vec<String>>,
    pub source: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub is_saved: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Recipe {
    pub fn total_time_minutes(&self) -> i32 {
        self.prep_time_minutes.unwrap_or(0) + self.cook_time_minutes.unwrap_or(0)
    }

    /// "25m", "1h", "1h 30m".
    pub fn formatted_time(&self) -> String {
        let total = self.total_time_minutes();
        if total < 60 {
            return format!("{total}m");
        }
        let hours = total / 60;
        let minutes = total % 60;
        if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        }
    }
}

const COLUMNS: &str = "id, title, description, image_url, prep_time_minutes, cook_time_minutes, \
                       servings, ingredients, instructions, nutrition, tags, source, rating, \
                       review_count, is_saved, created_at, updated_at";

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes");
    let rows = sqlx::query_as::<_, Recipe>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE id = $1");
    let row = sqlx::query_as::<_, Recipe>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Insert-or-replace keyed by id.
pub async fn save(db: &PgPool, recipe: &Recipe) -> anyhow::Result<Recipe> {
    let sql = format!(
        r#"
        INSERT INTO recipes
            (id, title, description, image_url, prep_time_minutes, cook_time_minutes, servings,
             ingredients, instructions, nutrition, tags, source, rating, review_count, is_saved,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            image_url = EXCLUDED.image_url,
            prep_time_minutes = EXCLUDED.prep_time_minutes,
            cook_time_minutes = EXCLUDED.cook_time_minutes,
            servings = EXCLUDED.servings,
            ingredients = EXCLUDED.ingredients,
            instructions = EXCLUDED.instructions,
            nutrition = EXCLUDED.nutrition,
            tags = EXCLUDED.tags,
            source = EXCLUDED.source,
            rating = EXCLUDED.rating,
            review_count = EXCLUDED.review_count,
            is_saved = EXCLUDED.is_saved,
            created_at = EXCLUDED.created_at,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Recipe>(&sql)
        .bind(recipe.id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.image_url)
        .bind(recipe.prep_time_minutes)
        .bind(recipe.cook_time_minutes)
        .bind(recipe.servings)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.nutrition)
        .bind(&recipe.tags)
        .bind(&recipe.source)
        .bind(recipe.rating)
        .bind(recipe.review_count)
        .bind(recipe.is_saved)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn exists_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_by_ingredient_containing(
    db: &PgPool,
    ingredient: &str,
) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM recipes
        WHERE EXISTS (
            SELECT 1 FROM jsonb_array_elements_text(ingredients) AS entry(name)
            WHERE entry.name ILIKE '%' || $1 || '%'
        )
        "#
    );
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(ingredient)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_ingredients_in(
    db: &PgPool,
    ingredients: &[String],
) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE ingredients ?| $1");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(ingredients)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_tags_in(db: &PgPool, tags: &[String]) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE tags ?| $1");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(tags)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Diet type lives in the tags; substring match, case-insensitive.
pub async fn find_by_diet_type(db: &PgPool, diet_type: &str) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM recipes
        WHERE EXISTS (
            SELECT 1 FROM jsonb_array_elements_text(tags) AS entry(tag)
            WHERE entry.tag ILIKE '%' || $1 || '%'
        )
        "#
    );
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(diet_type)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_max_calories(db: &PgPool, max_calories: f64) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM recipes WHERE (nutrition->>'calories')::double precision <= $1"
    );
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(max_calories)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_min_protein(db: &PgPool, min_protein: f64) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM recipes WHERE (nutrition->>'protein')::double precision >= $1"
    );
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(min_protein)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_max_prep_time(db: &PgPool, max_prep_time: i32) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE prep_time_minutes <= $1");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(max_prep_time)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_max_cook_time(db: &PgPool, max_cook_time: i32) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE cook_time_minutes <= $1");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(max_cook_time)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_saved(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE is_saved");
    let rows = sqlx::query_as::<_, Recipe>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn find_by_min_rating(db: &PgPool, min_rating: f64) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE rating >= $1");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(min_rating)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_title_containing(db: &PgPool, title: &str) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!("SELECT {COLUMNS} FROM recipes WHERE title ILIKE '%' || $1 || '%'");
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(title)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Combined filter: calories <= $1 AND protein >= $2 AND prep <= $3 AND cook <= $4.
pub async fn find_by_filters(
    db: &PgPool,
    max_calories: f64,
    min_protein: f64,
    max_prep_time: i32,
    max_cook_time: i32,
) -> anyhow::Result<Vec<Recipe>> {
    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM recipes
        WHERE (nutrition->>'calories')::double precision <= $1
          AND (nutrition->>'protein')::double precision >= $2
          AND prep_time_minutes <= $3
          AND cook_time_minutes <= $4
        "#
    );
    let rows = sqlx::query_as::<_, Recipe>(&sql)
        .bind(max_calories)
        .bind(min_protein)
        .bind(max_prep_time)
        .bind(max_cook_time)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with_times(prep: Option<i32>, cook: Option<i32>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: "test".into(),
            description: None,
            image_url: None,
            prep_time_minutes: prep,
            cook_time_minutes: cook,
            servings: None,
            ingredients: Json(Vec::new()),
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
    fn total_time_treats_absent_as_zero() {
        assert_eq!(recipe_with_times(Some(10), Some(20)).total_time_minutes(), 30);
        assert_eq!(recipe_with_times(None, Some(20)).total_time_minutes(), 20);
        assert_eq!(recipe_with_times(None, None).total_time_minutes(), 0);
    }

    #[test]
    fn formatted_time_variants() {
        assert_eq!(recipe_with_times(Some(10), Some(15)).formatted_time(), "25m");
        assert_eq!(recipe_with_times(Some(30), Some(30)).formatted_time(), "1h");
        assert_eq!(recipe_with_times(Some(60), Some(30)).formatted_time(), "1h 30m");
        assert_eq!(recipe_with_times(None, None).formatted_time(), "0m");
    }
}
