use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{DetectResponse, IngredientInput};
use super::repo::{self, Ingredient};
use super::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/detect",
            post(detect_ingredients).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .route("/ingredients/search", post(search_ingredients))
        .route("/ingredients/category/:category", get(by_category))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[instrument(skip(state))]
async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = repo::find_all(&state.db).await?;
    Ok(Json(ingredients))
}

#[instrument(skip(state))]
async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ingredient))
}

/// POST /ingredients/detect (multipart, field `image`)
#[instrument(skip(state, mp))]
async fn detect_ingredients(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let mut image: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("image") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "image/jpeg".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            image = Some((data, content_type));
            break;
        }
    }
    let Some((data, content_type)) = image else {
        return Err(ApiError::Validation(
            "multipart field 'image' is required".into(),
        ));
    };

    let result = services::detect_and_persist(&state, &data, &content_type).await;
    Ok(Json(result))
}

/// POST /ingredients/search — the raw body is the query string.
#[instrument(skip(state))]
async fn search_ingredients(
    State(state): State<AppState>,
    query: String,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = repo::find_by_name_containing(&state.db, query.trim()).await?;
    Ok(Json(ingredients))
}

#[instrument(skip(state))]
async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = repo::find_by_category(&state.db, &category).await?;
    Ok(Json(ingredients))
}

#[instrument(skip(state, input))]
async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<IngredientInput>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = services::create(&state.db, input).await?;
    Ok(Json(ingredient))
}

#[instrument(skip(state, input))]
async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<IngredientInput>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = services::update(&state.db, id, input)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ingredient))
}

#[instrument(skip(state))]
async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(), ApiError> {
    if services::delete(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}
