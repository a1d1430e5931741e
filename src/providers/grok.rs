use crate::core::error::HubError;
use crate::providers::openai_compatible::OpenAICompatibleClient;
use crate::providers::{LLMProvider, Provider, tag_stream};
use async_trait::async_trait;
use futures::stream::BoxStream;

const GROK_MODEL: &str = "grok-beta";
const GROK_MAX_TOKENS: u32 = 131072;

/// xAI's Grok, served through an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct GrokProvider {
    client: OpenAICompatibleClient,
}

impl GrokProvider {
    pub fn new(api_key: String, temperature: f32) -> Self {
        Self::with_endpoint(Provider::Grok.default_base_url().to_string(), api_key, temperature)
    }

    pub fn with_endpoint(endpoint: String, api_key: String, temperature: f32) -> Self {
        Self {
            client: OpenAICompatibleClient::new(
                endpoint,
                api_key,
                GROK_MODEL.to_string(),
                GROK_MAX_TOKENS,
                temperature,
            ),
        }
    }
}

#[async_trait]
impl LLMProvider for GrokProvider {
    fn kind(&self) -> Provider {
        Provider::Grok
    }

    fn model_name(&self) -> &str {
        &self.client.model
    }

    fn max_tokens(&self) -> u32 {
        self.client.max_tokens
    }

    async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        self.client
            .chat(message, system_prompt)
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
            .chat_stream(message, system_prompt)
            .await
            .map_err(|e| e.for_provider(self.kind()))?;
        Ok(tag_stream(self.kind(), stream))
    }
}
