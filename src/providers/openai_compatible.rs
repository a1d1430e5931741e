use crate::core::error::HubError;
use crate::providers::base_client::{HttpClient, sse_data};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Parser for one line of an OpenAI-compatible streaming response
pub fn openai_stream_parser(line: &str) -> Result<Option<String>, HubError> {
    let Some(data) = sse_data(line) else {
        return Ok(None);
    };
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let parsed: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| HubError::Serialization(format!("Failed to parse stream data: {}", e)))?;

    if let Some(message) = parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(HubError::Api(message.to_string()));
    }

    let text = parsed
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str());

    match text {
        Some(text) if !text.is_empty() => Ok(Some(text.to_string())),
        _ => Ok(None),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct ChatCompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Chat-completions client shared by every OpenAI-style endpoint.
#[derive(Clone)]
pub struct OpenAICompatibleClient {
    client: HttpClient,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl OpenAICompatibleClient {
    pub fn new(base_url: String, api_key: String, model: String, max_tokens: u32, temperature: f32) -> Self {
        // Use Bearer token authentication
        let auth_header = Some(("Authorization".to_string(), format!("Bearer {}", api_key)));

        Self {
            client: HttpClient::new(base_url, auth_header, None),
            model,
            max_tokens,
            temperature,
        }
    }

    fn build_request(
        &self,
        message: &str,
        system_prompt: Option<&str>,
        stream: bool,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatCompletionMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatCompletionMessage {
            role: "user",
            content: message.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: stream.then_some(true),
        }
    }

    pub async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        let payload = self.build_request(message, system_prompt, false);
        let response = self.client.post("chat/completions", &payload).await?;

        let response_body: String = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| HubError::Api("No choices in API response".to_string()))
    }

    pub async fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        let payload = self.build_request(message, system_prompt, true);
        let response = self.client.post("chat/completions", &payload).await?;
        Ok(self.client.stream_response(response, openai_stream_parser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delta_content() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(openai_stream_parser(line).unwrap().as_deref(), Some("Hel"));
    }

    #[test]
    fn ignores_done_role_and_blank_lines() {
        assert!(openai_stream_parser("data: [DONE]").unwrap().is_none());
        assert!(openai_stream_parser("").unwrap().is_none());
        let role_only = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(openai_stream_parser(role_only).unwrap().is_none());
    }

    #[test]
    fn surfaces_stream_errors() {
        let line = r#"data: {"error":{"message":"quota exceeded"}}"#;
        let err = openai_stream_parser(line).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(openai_stream_parser("data: {not json").is_err());
    }

    #[test]
    fn system_prompt_only_when_set() {
        let client = OpenAICompatibleClient::new(
            "https://example.invalid/v1".into(),
            "key".into(),
            "gpt-4".into(),
            8192,
            0.7,
        );
        let request = client.build_request("hi", None, true);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["stream"], true);

        let request = client.build_request("hi", Some("be brief"), false);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json.get("stream").is_none());
        assert_eq!(json["max_tokens"], 8192);
    }
}
