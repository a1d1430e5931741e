use crate::core::error::HubError;
use crate::providers::base_client::{HttpClient, sse_data};
use crate::providers::gemini::types::*;
use futures::stream::BoxStream;

/// Parser for one line of Gemini's SSE stream
pub fn gemini_stream_parser(line: &str) -> Result<Option<String>, HubError> {
    let Some(json_str) = sse_data(line) else {
        return Ok(None);
    };
    if json_str.is_empty() {
        return Ok(None);
    }

    let parsed: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        HubError::Serialization(format!(
            "Failed to parse stream data: {}. Data: '{}'",
            e, json_str
        ))
    })?;

    if let Some(message) = parsed["error"]["message"].as_str() {
        return Err(HubError::Api(message.to_string()));
    }

    let response: GeminiResponse = serde_json::from_value(parsed)?;
    Ok(response.text())
}

#[derive(Clone)]
pub struct GeminiClient {
    pub model: String,
    pub max_tokens: u32,
    client: HttpClient,
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model: String, max_tokens: u32) -> Self {
        let mut client = HttpClient::new(base_url, None, None);

        // Add API key to query params
        client.add_query_param("key", api_key);

        Self {
            client,
            model,
            max_tokens,
        }
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, HubError> {
        let payload = self.build_payload(prompt);
        let response = self
            .client
            .post(&format!("v1beta/models/{}:generateContent", self.model), &payload)
            .await?;

        let response_body: String = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&response_body).map_err(|e| {
            HubError::Serialization(format!("Failed to parse Gemini response: {}", e))
        })?;

        parsed
            .text()
            .ok_or_else(|| HubError::Api("No valid response from Gemini".to_string()))
    }

    pub async fn generate_content_stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        let payload = self.build_payload(prompt);
        let mut client = self.client.clone();
        client.add_query_param("alt", "sse".to_string());
        let response = client
            .post(
                &format!("v1beta/models/{}:streamGenerateContent", self.model),
                &payload,
            )
            .await?;

        Ok(client.stream_response(response, gemini_stream_parser))
    }

    fn build_payload(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        }
    }
}
