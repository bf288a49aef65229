use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::UserInput;
use super::repo::{self, User, UserPreferences};
use crate::error::ApiError;

pub async fn create(db: &PgPool, input: UserInput) -> Result<User, ApiError> {
    validate(&input)?;
    let now = OffsetDateTime::now_utc();
    let user = User {
        id: Uuid::new_v4(),
        email: input.email,
        name: input.name,
        profile_image_url: input.profile_image_url,
        dietary_preferences: Json(input.dietary_preferences),
        allergies: Json(input.allergies),
        saved_recipes: Json(input.saved_recipes),
        favorite_ingredients: Json(input.favorite_ingredients),
        preferences: Json(input.preferences),
        created_at: Some(now),
        last_login_at: Some(now),
        updated_at: Some(now),
    };
    Ok(repo::save(db, &user).await?)
}

/// Full replace; created-at and last-login survive, updated-at is
/// re-stamped.
pub async fn update(db: &PgPool, id: Uuid, input: UserInput) -> Result<Option<User>, ApiError> {
    validate(&input)?;
    let Some(existing) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    let user = User {
        id,
        email: input.email,
        name: input.name,
        profile_image_url: input.profile_image_url,
        dietary_preferences: Json(input.dietary_preferences),
        allergies: Json(input.allergies),
        saved_recipes: Json(input.saved_recipes),
        favorite_ingredients: Json(input.favorite_ingredients),
        preferences: Json(input.preferences),
        created_at: existing.created_at,
        last_login_at: existing.last_login_at,
        updated_at: Some(OffsetDateTime::now_utc()),
    };
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn update_preferences(
    db: &PgPool,
    id: Uuid,
    preferences: UserPreferences,
) -> anyhow::Result<Option<User>> {
    let Some(mut user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    user.preferences = Json(preferences);
    user.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn add_saved_recipe(
    db: &PgPool,
    id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<User>> {
    let Some(mut user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    add_unique(&mut user.saved_recipes, recipe_id);
    user.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn remove_saved_recipe(
    db: &PgPool,
    id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<User>> {
    let Some(mut user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    remove_value(&mut user.saved_recipes, &recipe_id);
    user.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn add_favorite_ingredient(
    db: &PgPool,
    id: Uuid,
    name: String,
) -> anyhow::Result<Option<User>> {
    let Some(mut user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    add_unique(&mut user.favorite_ingredients, name);
    user.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn remove_favorite_ingredient(
    db: &PgPool,
    id: Uuid,
    name: &str,
) -> anyhow::Result<Option<User>> {
    let Some(mut user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    remove_value(&mut user.favorite_ingredients, &name.to_string());
    user.updated_at = Some(OffsetDateTime::now_utc());
    Ok(Some(repo::save(db, &user).await?))
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    if !repo::exists_by_id(db, id).await? {
        return Ok(false);
    }
    repo::delete_by_id(db, id).await?;
    Ok(true)
}

fn validate(input: &UserInput) -> Result<(), ApiError> {
    if input.email.trim().is_empty() {
        return Err(ApiError::Validation("email must not be empty".into()));
    }
    Ok(())
}

/// Append unless already present; no-op otherwise.
fn add_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Drop every occurrence; no-op when absent.
fn remove_value<T: PartialEq>(list: &mut Vec<T>, value: &T) {
    list.retain(|v| v != value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_unique_is_idempotent() {
        let mut favorites = vec!["basil".to_string()];
        add_unique(&mut favorites, "basil".to_string());
        assert_eq!(favorites, vec!["basil"]);

        add_unique(&mut favorites, "thyme".to_string());
        assert_eq!(favorites, vec!["basil", "thyme"]);
    }

    #[test]
    fn remove_value_tolerates_absent_entries() {
        let mut saved = vec![Uuid::new_v4(), Uuid::new_v4()];
        let missing = Uuid::new_v4();
        remove_value(&mut saved, &missing);
        assert_eq!(saved.len(), 2);

        let present = saved[0];
        remove_value(&mut saved, &present);
        assert_eq!(saved.len(), 1);
        assert!(!saved.contains(&present));
    }
}
