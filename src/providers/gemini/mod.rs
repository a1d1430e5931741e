use crate::core::error::HubError;
use crate::providers::{LLMProvider, Provider, tag_stream};
use async_trait::async_trait;
use futures::stream::BoxStream;

mod client;
mod types;

pub use client::GeminiClient;

const GEMINI_MODEL: &str = "gemini-pro";
const GEMINI_MAX_TOKENS: u32 = 8192;

/// Folds the system prompt into the user turn; the endpoint receives one prompt.
fn full_prompt(message: &str, system_prompt: Option<&str>) -> String {
    match system_prompt {
        Some(system) => format!("{}\n\nUser: {}", system, message),
        None => message.to_string(),
    }
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(Provider::Gemini.default_base_url().to_string(), api_key)
    }

    pub fn with_endpoint(endpoint: String, api_key: String) -> Self {
        Self {
            client: GeminiClient::new(endpoint, api_key, GEMINI_MODEL.to_string(), GEMINI_MAX_TOKENS),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn kind(&self) -> Provider {
        Provider::Gemini
    }

    fn model_name(&self) -> &str {
        &self.client.model
    }

    fn max_tokens(&self) -> u32 {
        self.client.max_tokens
    }

    async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        self.client
            .generate_content(&full_prompt(message, system_prompt))
            .await
            .map_err(|e| e.for_provider(self.kind()))
    }

    async fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        let stream = self
            .client
            .generate_content_stream(&full_prompt(message, system_prompt))
            .await
            .map_err(|e| e.for_provider(self.kind()))?;
        Ok(tag_stream(self.kind(), stream))
    }
}
