use crate::core::error::HubError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

pub use crate::config::Provider;

/// Uniform surface over one vendor's chat API.
///
/// Each client is bound to a single model for its whole lifetime. Failures
/// from both operations are tagged with the provider that produced them.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn kind(&self) -> Provider;

    fn model_name(&self) -> &str;

    fn max_tokens(&self) -> u32;

    async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError>;

    /// Streams the answer as text chunks in arrival order. The stream is
    /// finite and can only be consumed once; it may fail before the first
    /// chunk or mid-way.
    async fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError>;
}

/// Tags every error item of a chunk stream with `provider`.
pub fn tag_stream(
    provider: Provider,
    stream: BoxStream<'static, Result<String, HubError>>,
) -> BoxStream<'static, Result<String, HubError>> {
    stream
        .map(move |item| item.map_err(|e| e.for_provider(provider)))
        .boxed()
}

pub mod anthropic;
pub mod base_client;
pub mod factory;
pub mod gemini;
pub mod grok;
pub mod openai;
pub mod openai_compatible;
