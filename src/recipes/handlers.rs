use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GenerateSaveRequest, GenerateSaveResponse, RecipeFilters, RecipeInput};
use super::repo::{self, Recipe};
use super::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/search", post(search_by_ingredients))
        .route("/recipes/search/filters", post(search_with_filters))
        .route("/recipes/saved", get(saved_recipes))
        .route("/recipes/popular", get(popular_recipes))
        .route("/recipes/recent", get(recent_recipes))
        .route("/recipes/generate", post(generate_recipes))
        .route("/recipes/generate/save", post(save_generated_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:id/save", post(save_recipe))
        .route("/recipes/:id/unsave", delete(unsave_recipe))
}

#[instrument(skip(state))]
async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = repo::find_all(&state.db).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(recipe))
}

/// POST /recipes/search — body is a JSON list of ingredient names.
/// An absent or unparsable body means "no filter".
#[instrument(skip(state, body))]
async fn search_by_ingredients(
    State(state): State<AppState>,
    body: Option<Json<Vec<String>>>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let queries = body.map(|Json(q)| q);
    let recipes = services::search_by_ingredients(&state.db, queries).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
async fn search_with_filters(
    State(state): State<AppState>,
    Json(filters): Json<RecipeFilters>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = services::search_with_filters(&state.db, &filters).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
async fn saved_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = repo::find_saved(&state.db).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
async fn save_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = services::save_recipe(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
async fn unsave_recipe(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    if services::unsave_recipe(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

#[instrument(skip(state))]
async fn popular_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = services::popular(&state.db).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
async fn recent_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = services::recent(&state.db).await?;
    Ok(Json(recipes))
}

/// POST /recipes/generate — returns the generated markdown as plain text.
#[instrument(skip(state, ingredients))]
async fn generate_recipes(
    State(state): State<AppState>,
    Json(ingredients): Json<Vec<String>>,
) -> Result<String, ApiError> {
    let markdown = services::generate_from_ai(&state, &ingredients).await?;
    Ok(markdown)
}

#[instrument(skip(state, payload))]
async fn save_generated_recipe(
    State(state): State<AppState>,
    Json(payload): Json<GenerateSaveRequest>,
) -> Result<Json<GenerateSaveResponse>, ApiError> {
    let recipe = services::save_generated(&state.db, payload).await?;
    Ok(Json(GenerateSaveResponse {
        success: true,
        recipe,
    }))
}

#[instrument(skip(state, input))]
async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = services::create(&state.db, input).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state, input))]
async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = services::update(&state.db, id, input)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
async fn delete_recipe(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    if services::delete(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}
