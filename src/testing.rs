//! Scripted provider for exercising the session engine without a network.

use crate::config::Provider;
use crate::core::error::HubError;
use crate::providers::LLMProvider;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;

pub enum Reply {
    /// Streamed chunk by chunk; `chat` concatenates the successful ones.
    Chunks(Vec<Result<String, HubError>>),
    /// The call itself fails before any chunk.
    Fail(HubError),
    /// Yields these chunks, then never ends.
    Stall(Vec<String>),
}

pub fn chunks(parts: &[&str]) -> Reply {
    Reply::Chunks(parts.iter().map(|p| Ok(p.to_string())).collect())
}

pub struct MockProvider {
    model: String,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockProvider {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            model: "mock-model".to_string(),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every `(message, system_prompt)` pair sent so far.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self, message: &str, system_prompt: Option<&str>) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), system_prompt.map(str::to_string)));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(HubError::Unknown("no scripted reply".into())))
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn kind(&self) -> Provider {
        Provider::Grok
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        4096
    }

    async fn chat(&self, message: &str, system_prompt: Option<&str>) -> Result<String, HubError> {
        match self.next_reply(message, system_prompt) {
            Reply::Chunks(items) => items.into_iter().collect(),
            Reply::Fail(e) => Err(e.for_provider(Provider::Grok)),
            Reply::Stall(_) => std::future::pending().await,
        }
    }

    async fn chat_stream(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
        match self.next_reply(message, system_prompt) {
            Reply::Chunks(items) => Ok(stream::iter(items)
                .map(|item| item.map_err(|e| e.for_provider(Provider::Grok)))
                .boxed()),
            Reply::Fail(e) => Err(e.for_provider(Provider::Grok)),
            Reply::Stall(parts) => Ok(stream::iter(parts.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
        }
    }
}
