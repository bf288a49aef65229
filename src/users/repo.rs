use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub theme: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub auto_save_recipes: bool,
    pub default_servings: i32,
    pub default_diet_type: String,
    pub preferred_cuisines: Vec<String>,
    pub max_prep_time: i32,
    pub max_cook_time: i32,
    pub show_nutrition_info: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: "system".into(),
            language: "en".into(),
            notifications_enabled: true,
            auto_save_recipes: true,
            default_servings: 4,
            default_diet_type: "balanced".into(),
            preferred_cuisines: Vec::new(),
            max_prep_time: 60,
            max_cook_time: 60,
            show_nutrition_info: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub dietary_preferences: Json<Vec<String>>,
    pub allergies: Json<Vec<String>>,
    pub saved_recipes: Json<Vec<Uuid>>,
    pub favorite_ingredients: Json<Vec<String>>,
    pub preferences: Json<UserPreferences>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

const COLUMNS: &str = "id, email, name, profile_image_url, dietary_preferences, allergies, \
                       saved_recipes, favorite_ingredients, preferences, created_at, \
                       last_login_at, updated_at";

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users");
    let rows = sqlx::query_as::<_, User>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Insert-or-replace keyed by id.
pub async fn save(db: &PgPool, user: &User) -> anyhow::Result<User> {
    let sql = format!(
        r#"
        INSERT INTO users
            (id, email, name, profile_image_url, dietary_preferences, allergies, saved_recipes,
             favorite_ingredients, preferences, created_at, last_login_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            email = EXCLUDED.email,
            name = EXCLUDED.name,
            profile_image_url = EXCLUDED.profile_image_url,
            dietary_preferences = EXCLUDED.dietary_preferences,
            allergies = EXCLUDED.allergies,
            saved_recipes = EXCLUDED.saved_recipes,
            favorite_ingredients = EXCLUDED.favorite_ingredients,
            preferences = EXCLUDED.preferences,
            created_at = EXCLUDED.created_at,
            last_login_at = EXCLUDED.last_login_at,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.profile_image_url)
        .bind(&user.dietary_preferences)
        .bind(&user.allergies)
        .bind(&user.saved_recipes)
        .bind(&user.favorite_ingredients)
        .bind(&user.preferences)
        .bind(user.created_at)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn exists_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_defaults() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.theme, "system");
        assert_eq!(prefs.language, "en");
        assert!(prefs.notifications_enabled);
        assert!(prefs.auto_save_recipes);
        assert_eq!(prefs.default_servings, 4);
        assert_eq!(prefs.default_diet_type, "balanced");
        assert!(prefs.preferred_cuisines.is_empty());
        assert_eq!(prefs.max_prep_time, 60);
        assert_eq!(prefs.max_cook_time, 60);
        assert!(prefs.show_nutrition_info);
    }

    #[test]
    fn partial_preferences_payload_fills_defaults() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"theme": "dark", "defaultServings": 2}"#).unwrap();
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.default_servings, 2);
        assert_eq!(prefs.language, "en");
        assert_eq!(prefs.max_cook_time, 60);
    }
}
