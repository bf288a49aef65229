use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub confidence: Option<f64>,
    pub is_detected: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub detected_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Ingredient {
    pub fn is_high_confidence(&self) -> bool {
        matches!(self.confidence, Some(c) if c >= 0.8)
    }

    pub fn is_medium_confidence(&self) -> bool {
        matches!(self.confidence, Some(c) if (0.5..0.8).contains(&c))
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(self.confidence, Some(c) if c < 0.5)
    }
}

const COLUMNS: &str =
    "id, name, category, image_url, confidence, is_detected, detected_at, created_at, updated_at";

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients");
    let rows = sqlx::query_as::<_, Ingredient>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE id = $1");
    let row = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Insert-or-replace keyed by id.
pub async fn save(db: &PgPool, ingredient: &Ingredient) -> anyhow::Result<Ingredient> {
    let sql = format!(
        r#"
        INSERT INTO ingredients
            (id, name, category, image_url, confidence, is_detected, detected_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            category = EXCLUDED.category,
            image_url = EXCLUDED.image_url,
            confidence = EXCLUDED.confidence,
            is_detected = EXCLUDED.is_detected,
            detected_at = EXCLUDED.detected_at,
            created_at = EXCLUDED.created_at,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.category)
        .bind(&ingredient.image_url)
        .bind(ingredient.confidence)
        .bind(ingredient.is_detected)
        .bind(ingredient.detected_at)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn exists_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ingredients WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_by_name_containing(db: &PgPool, name: &str) -> anyhow::Result<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE name ILIKE '%' || $1 || '%'");
    let rows = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(name)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_category(db: &PgPool, category: &str) -> anyhow::Result<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE category = $1");
    let rows = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(category)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_detected(db: &PgPool) -> anyhow::Result<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE is_detected");
    let rows = sqlx::query_as::<_, Ingredient>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn find_by_min_confidence(
    db: &PgPool,
    min_confidence: f64,
) -> anyhow::Result<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE confidence >= $1");
    let rows = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(min_confidence)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient_with_confidence(confidence: Option<f64>) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "tomato".into(),
            category: None,
            image_url: None,
            confidence,
            is_detected: false,
            detected_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn confidence_classification_boundaries() {
        let high = ingredient_with_confidence(Some(0.8));
        assert!(high.is_high_confidence());
        assert!(!high.is_medium_confidence());

        let medium = ingredient_with_confidence(Some(0.5));
        assert!(medium.is_medium_confidence());
        assert!(!medium.is_high_confidence());
        assert!(!medium.is_low_confidence());

        let low = ingredient_with_confidence(Some(0.49));
        assert!(low.is_low_confidence());
    }

    #[test]
    fn absent_confidence_matches_no_class() {
        let unknown = ingredient_with_confidence(None);
        assert!(!unknown.is_high_confidence());
        assert!(!unknown.is_medium_confidence());
        assert!(!unknown.is_low_confidence());
    }
}
