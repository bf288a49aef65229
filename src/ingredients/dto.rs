use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Ingredient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_detected: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub detected_at: Option<OffsetDateTime>,
}

/// Body of the `/ingredients/detect` response. Always delivered with
/// HTTP 200; failures are discriminated by `success`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub success: bool,
    pub message: String,
    pub ingredients: Vec<Ingredient>,
    pub ingredient_names: Vec<String>,
}

impl DetectResponse {
    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            ingredients: Vec::new(),
            ingredient_names: Vec::new(),
        }
    }
}
