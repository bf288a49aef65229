use serde::Deserialize;
use uuid::Uuid;

use super::repo::UserPreferences;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub saved_recipes: Vec<Uuid>,
    #[serde(default)]
    pub favorite_ingredients: Vec<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
}
