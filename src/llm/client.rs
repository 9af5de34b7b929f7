use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";
const LIST_PAGE_SIZE: &str = "1000";

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One `generateContent` call; returns the reply text.
    async fn generate_content(&self, model: &str, parts: Vec<Part>) -> Result<String>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        self.generate_content(model, vec![Part::text(prompt)]).await
    }

    async fn generate_with_file(
        &self,
        model: &str,
        prompt: &str,
        file: EncodedFile,
    ) -> Result<String> {
        self.generate_content(model, vec![Part::text(prompt), Part::file(file)])
            .await
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("Gemini API key is not configured"))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model_path(model))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
            _ => body,
        };
        Err(Error::upstream(format!(
            "Gemini API error {}: {}",
            status, message
        )))
    }
}

/// `gemini-2.5-flash` and `models/gemini-2.5-flash` address the same model.
pub fn model_path(model: &str) -> String {
    let model = model.trim().trim_start_matches('/');
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_content(&self, model: &str, parts: Vec<Part>) -> Result<String> {
        debug!(model = %model, parts = parts.len(), "Sending generateContent request");

        let request = GenerateContentRequest::user(parts);
        let response = self
            .client
            .post(self.generate_url(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response: GenerateContentResponse = Self::check(response).await?.json().await?;

        match response.text() {
            Some(text) => {
                debug!(model = %model, chars = text.len(), "Received model response");
                Ok(text)
            }
            None => Err(Error::upstream(match response.empty_reason() {
                Some(reason) => format!("Model returned no text ({})", reason),
                None => "Model returned no text".to_string(),
            })),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .query(&query)
                .send()
                .await?;
            let page: ListModelsResponse = Self::check(response).await?.json().await?;
            debug!(count = page.models.len(), "Fetched model page");

            models.extend(page.models);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_config() -> LlmConfig {
        LlmConfig {
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            api_key: Some("test-api-key".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_model_path_adds_prefix() {
        assert_eq!(model_path("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(model_path("models/gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(model_path("tunedModels/my-model"), "tunedModels/my-model");
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let client = GeminiClient::new(&create_test_config()).unwrap();
        assert_eq!(
            client.generate_url("models/gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_client_requires_api_key() {
        let mut config = create_test_config();
        config.api_key = None;
        assert!(matches!(GeminiClient::new(&config), Err(Error::Config(_))));
    }
}
