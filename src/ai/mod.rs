pub mod gemini;
pub mod parser;

use async_trait::async_trait;
use thiserror::Error;

/// Failures from the provider gateway and its response post-processing.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no image uploaded")]
    EmptyImage,
    #[error("provider request failed: {0}")]
    Provider(String),
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("no JSON array found in response: {0}")]
    NoStructuredData(String),
    #[error("could not parse ingredient array: {0}")]
    MalformedPayload(String),
}

/// Outbound calls to the generative-AI provider.
///
/// Injected into `AppState` so tests can substitute a stub; one attempt per
/// call, no retries.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Detect food and beverage items on a photo. Returns a deduplicated
    /// list of ingredient names in first-seen order.
    async fn detect_ingredients(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<String>, AiError>;

    /// Generate recipe suggestions for the given ingredients. The returned
    /// markdown is stored verbatim, never parsed into structure.
    async fn generate_recipes(&self, ingredients: &[String]) -> Result<String, AiError>;
}
