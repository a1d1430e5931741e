use crate::config::{Config, ModelChoice, Provider};
use crate::core::error::HubError;
use crate::providers::{
    LLMProvider, anthropic::AnthropicProvider, gemini::GeminiProvider, grok::GrokProvider,
    openai::OpenAIProvider,
};
use std::collections::HashMap;

type ProviderCreator =
    Box<dyn Fn(String, ModelChoice, &Config) -> Box<dyn LLMProvider> + Send + Sync>;

pub struct ProviderFactory {
    creators: HashMap<Provider, ProviderCreator>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        let mut creators = HashMap::new();

        creators.insert(
            Provider::Grok,
            Box::new(|api_key: String, _model: ModelChoice, config: &Config| {
                Box::new(GrokProvider::new(api_key, config.temperature())) as Box<dyn LLMProvider>
            }) as ProviderCreator,
        );

        creators.insert(
            Provider::Claude,
            Box::new(|api_key: String, _model: ModelChoice, _config: &Config| {
                Box::new(AnthropicProvider::new(api_key)) as Box<dyn LLMProvider>
            }) as ProviderCreator,
        );

        creators.insert(
            Provider::Gemini,
            Box::new(|api_key: String, _model: ModelChoice, _config: &Config| {
                Box::new(GeminiProvider::new(api_key)) as Box<dyn LLMProvider>
            }) as ProviderCreator,
        );

        creators.insert(
            Provider::OpenAI,
            Box::new(|api_key: String, model: ModelChoice, config: &Config| {
                Box::new(OpenAIProvider::new(
                    api_key,
                    model.as_str().to_string(),
                    config.temperature(),
                )) as Box<dyn LLMProvider>
            }) as ProviderCreator,
        );

        Self { creators }
    }

    /// Builds the client for `model`, failing when its provider has no key.
    pub fn create(
        &self,
        model: ModelChoice,
        config: &Config,
    ) -> Result<Box<dyn LLMProvider>, HubError> {
        let provider = model.provider();
        let api_key = config.api_key(provider).ok_or_else(|| {
            HubError::Config(format!(
                "{} API key not found. Please run 'hub --setup' to configure.",
                provider
            ))
        })?;

        self.creators
            .get(&provider)
            .map(|creator| creator(api_key, model, config))
            .ok_or_else(|| HubError::Config(format!("Provider not found: {}", provider)))
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}
