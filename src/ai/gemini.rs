use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use super::{parser, AiClient, AiError};
use crate::config::GeminiConfig;

const DETECT_PROMPT: &str = "Analyze this receipt image and extract ONLY food and beverage \
items that can be used for cooking. Include: vegetables, fruits, meat, dairy, beverages \
(coffee, latte, espresso, tea, etc.), grains, pasta, rice, spices, condiments, oils, and any \
other edible ingredients. DO NOT include: paper products, cleaning supplies, toiletries, or \
other non-food items. Return ONLY a valid JSON array of ingredient names as strings. Format \
example: [\"tomatoes\", \"chicken\", \"rice\", \"olive oil\"]. Do not include prices, \
quantities, or any other text - ONLY the ingredient names in a JSON array.";

/// Gemini `generateContent` client.
///
/// The API key travels as a query-string credential, so transport errors are
/// stripped of their URL before they become messages.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        tracing::info!(
            model = %config.model,
            key = %config.masked_key(),
            "gemini client initialized"
        );
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn generate_content(&self, body: serde_json::Value) -> Result<String, AiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Provider(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Provider(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::Provider(e.without_url().to_string()))?;
        tracing::debug!(model = %self.model, "gemini response received");

        parser::extract_text(&payload)
    }
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn detect_ingredients(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<String>, AiError> {
        if image.is_empty() {
            return Err(AiError::EmptyImage);
        }

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": DETECT_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": BASE64.encode(image) } }
                ]
            }]
        });

        let text = self.generate_content(body).await?;
        parser::parse_ingredients(&text)
    }

    async fn generate_recipes(&self, ingredients: &[String]) -> Result<String, AiError> {
        let ingredient_text = ingredients.join(", ");
        let prompt = format!(
            "Create 3 simple, budget-friendly recipes using these ingredients: {ingredient_text}.\n\n\
             For each recipe provide:\n\
             - A creative recipe name\n\
             - Ingredients list (using ONLY the provided ingredients)\n\
             - Step-by-step cooking instructions\n\
             - Estimated prep time and cook time\n\n\
             Format the response in clean Markdown with headers (##) for each recipe."
        );

        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        self.generate_content(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: "test-key".into(),
            model: "gemini-2.5-flash".into(),
            base_url: server.url(),
        })
    }

    #[tokio::test]
    async fn detect_parses_fenced_provider_output() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "candidates": [{
                        "content": {
                            "parts": [{
                                "text": "```json\n[\"tomatoes\", \"tomatoes\", \" olive oil \"]\n```"
                            }]
                        }
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let names = client
            .detect_ingredients(b"fake-image-bytes", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(names, vec!["tomatoes", "olive oil"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn detect_surfaces_non_2xx_as_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .detect_ingredients(b"fake-image-bytes", "image/jpeg")
            .await
            .unwrap_err();

        match err {
            AiError::Provider(msg) => assert!(msg.contains("503")),
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn detect_rejects_empty_image_without_request() {
        let server = Server::new_async().await;
        let client = client_for(&server);
        assert!(matches!(
            client.detect_ingredients(&[], "image/jpeg").await,
            Err(AiError::EmptyImage)
        ));
    }

    #[tokio::test]
    async fn generate_returns_markdown_verbatim() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r###"{
                    "candidates": [{
                        "content": { "parts": [{ "text": "## Tomato Pasta\n1. Boil." }] }
                    }]
                }"###,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let text = client
            .generate_recipes(&["tomato".into(), "pasta".into()])
            .await
            .unwrap();
        assert_eq!(text, "## Tomato Pasta\n1. Boil.");
    }
}
