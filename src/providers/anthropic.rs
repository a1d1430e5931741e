use crate::core::error::HubError;
use crate::providers::base_client::{HttpClient, sse_data};
use crate::providers::{LLMProvider, Provider, tag_stream};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
const CLAUDE_MAX_TOKENS: u32 = 8192;
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Parser for one line of Anthropic's streaming response
pub fn anthropic_stream_parser(line: &str) -> Result<Option<String>, HubError> {
    let Some(data_json) = sse_data(line) else {
        return Ok(None);
    };
    if data_json.is_empty() {
        return Ok(None);
    }
    let parsed: Value = match serde_json::from_str(data_json) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    if parsed["type"] == "content_block_delta" && parsed["delta"]["type"] == "text_delta" {
        if let Some(text) = parsed["delta"]["text"].as_str() {
            return Ok(Some(text.to_string()));
        }
    } else if parsed["type"] == "error" {
        let message = parsed["error"]["message"]
            .as_str()
            .unwrap_or("unknown stream error");
        return Err(HubError::Api(message.to_string()));
    }

    Ok(None)
}

#[derive(Clone)]
pub struct AnthropicProvider {
    client: HttpClient,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(Provider::Claude.default_base_url().to_string(), api_key)
    }

    pub fn with_endpoint(endpoint: String, api_key: String) -> Self {
        let mut extra_headers = HashMap::new();
        extra_headers.insert("anthropic-version".to_string(), "2023-06-01".to_string());
        Self {
            client: HttpClient::new(
                endpoint,
                Some(("x-api-key".to_string(), api_key)),
                Some(extra_headers),
            ),
            model: CLAUDE_MODEL.to_string(),
        }
    }

    fn build_request(&self, message: &str, system_prompt: Option<&str>, stream: bool) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: CLAUDE_MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user",
                content: message.to_string(),
            }],
            stream,
            system: system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT).to_string(),
        }
    }

    async fn send(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        let payload = self.build_request(message, system_prompt, false);
        let response = self.client.post("messages", &payload).await?;
        let response_body = response.text().await?;
        let parsed: AnthropicResponse = serde_json::from_str(&response_body)?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| HubError::Api("Empty response from Anthropic".to_string()))
    }

    async fn send_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        let payload = self.build_request(message, system_prompt, true);
        let response = self.client.post("messages", &payload).await?;
        Ok(self.client.stream_response(response, anthropic_stream_parser))
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn kind(&self) -> Provider {
        Provider::Claude
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        CLAUDE_MAX_TOKENS
    }

    async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        self.send(message, system_prompt)
            .await
            .map_err(|e| e.for_provider(self.kind()))
    }

    async fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        let stream = self
            .send_stream(message, system_prompt)
            .await
            .map_err(|e| e.for_provider(self.kind()))?;
        Ok(tag_stream(self.kind(), stream))
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    stream: bool,
    system: String,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
