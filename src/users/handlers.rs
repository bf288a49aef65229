use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::UserInput;
use super::repo::{self, User, UserPreferences};
use super::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/email/:email", get(get_user_by_email))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/preferences", put(update_preferences))
        .route(
            "/users/:id/saved-recipes/:recipe_id",
            post(add_saved_recipe).delete(remove_saved_recipe),
        )
        .route(
            "/users/:id/favorite-ingredients/:name",
            post(add_favorite_ingredient).delete(remove_favorite_ingredient),
        )
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = repo::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state, input))]
async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, ApiError> {
    let user = services::create(&state.db, input).await?;
    Ok(Json(user))
}

#[instrument(skip(state, input))]
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, ApiError> {
    let user = services::update(&state.db, id, input)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state, preferences))]
async fn update_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(preferences): Json<UserPreferences>,
) -> Result<Json<User>, ApiError> {
    let user = services::update_preferences(&state.db, id, preferences)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn add_saved_recipe(
    State(state): State<AppState>,
    Path((id, recipe_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<User>, ApiError> {
    let user = services::add_saved_recipe(&state.db, id, recipe_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn remove_saved_recipe(
    State(state): State<AppState>,
    Path((id, recipe_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<User>, ApiError> {
    let user = services::remove_saved_recipe(&state.db, id, recipe_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn add_favorite_ingredient(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<User>, ApiError> {
    let user = services::add_favorite_ingredient(&state.db, id, name)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn remove_favorite_ingredient(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<User>, ApiError> {
    let user = services::remove_favorite_ingredient(&state.db, id, &name)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn delete_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    if services::delete(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}
