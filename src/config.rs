use anyhow::Context;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// Truncated form of the API key, safe to emit in diagnostics.
    pub fn masked_key(&self) -> String {
        let head: String = self.api_key.chars().take(10).collect();
        format!("{head}...")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        anyhow::ensure!(!api_key.is_empty(), "GEMINI_API_KEY is empty");

        let gemini = GeminiConfig {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into())
                .trim_end_matches('/')
                .to_string(),
        };

        Ok(Self {
            database_url,
            gemini,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_key_truncates_long_keys() {
        let config = GeminiConfig {
            api_key: "AIzaSyA-very-long-secret-key".into(),
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
        };
        assert_eq!(config.masked_key(), "AIzaSyA-ve...");
    }

    #[test]
    fn masked_key_tolerates_short_keys() {
        let config = GeminiConfig {
            api_key: "abc".into(),
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
        };
        assert_eq!(config.masked_key(), "abc...");
    }
}
