use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{DetectResponse, IngredientInput};
use super::repo::{self, Ingredient};
use crate::error::ApiError;
use crate::state::AppState;

/// Run ingredient detection on an image and persist the results.
///
/// Every failure mode on this path (gateway, parser, storage) folds into a
/// `success: false` body; the caller always gets a discriminated result,
/// never an HTTP error. A single unpersistable name is logged and skipped,
/// it does not abort the batch.
pub async fn detect_and_persist(state: &AppState, image: &[u8], mime_type: &str) -> DetectResponse {
    let names = match state.ai.detect_ingredients(image, mime_type).await {
        Ok(names) => names,
        Err(e) => return DetectResponse::failure(format!("Failed to detect ingredients: {e}")),
    };

    if names.is_empty() {
        return DetectResponse {
            success: false,
            message: "No food ingredients detected in the image".into(),
            ingredients: Vec::new(),
            ingredient_names: Vec::new(),
        };
    }

    let mut saved = Vec::with_capacity(names.len());
    for name in &names {
        match persist_detected(&state.db, name).await {
            Ok(ingredient) => saved.push(ingredient),
            Err(e) => {
                tracing::warn!(error = %e, name = %name, "failed to persist detected ingredient");
            }
        }
    }

    DetectResponse {
        success: true,
        message: format!("Detected {} ingredients", saved.len()),
        ingredients: saved,
        ingredient_names: names,
    }
}

/// Reuse the first existing ingredient whose name fuzzily matches,
/// otherwise record a fresh detected one.
async fn persist_detected(db: &PgPool, name: &str) -> anyhow::Result<Ingredient> {
    let existing = repo::find_by_name_containing(db, name).await?;
    if let Some(first) = existing.into_iter().next() {
        return Ok(first);
    }

    let now = OffsetDateTime::now_utc();
    let ingredient = Ingredient {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: Some("detected".into()),
        image_url: None,
        confidence: None,
        is_detected: true,
        detected_at: Some(now),
        created_at: Some(now),
        updated_at: Some(now),
    };
    repo::save(db, &ingredient).await
}

pub async fn create(db: &PgPool, input: IngredientInput) -> Result<Ingredient, ApiError> {
    validate(&input)?;
    let now = OffsetDateTime::now_utc();
    let ingredient = Ingredient {
        id: Uuid::new_v4(),
        name: input.name,
        category: input.category,
        image_url: input.image_url,
        confidence: input.confidence,
        is_detected: input.is_detected.unwrap_or(false),
        detected_at: input.detected_at,
        created_at: Some(now),
        updated_at: Some(now),
    };
    Ok(repo::save(db, &ingredient).await?)
}

/// Full replace; the original created-at is preserved, updated-at re-stamped.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: IngredientInput,
) -> Result<Option<Ingredient>, ApiError> {
    validate(&input)?;
    let Some(existing) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    let ingredient = Ingredient {
        id,
        name: input.name,
        category: input.category,
        image_url: input.image_url,
        confidence: input.confidence,
        is_detected: input.is_detected.unwrap_or(false),
        detected_at: input.detected_at,
        created_at: existing.created_at,
        updated_at: Some(OffsetDateTime::now_utc()),
    };
    Ok(Some(repo::save(db, &ingredient).await?))
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    if !repo::exists_by_id(db, id).await? {
        return Ok(false);
    }
    repo::delete_by_id(db, id).await?;
    Ok(true)
}

fn validate(input: &IngredientInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if let Some(confidence) = input.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ApiError::Validation(
                "confidence must lie in [0, 1]".into(),
            ));
        }
    }
    Ok(())
}
