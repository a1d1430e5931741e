pub mod setup;

use crate::core::error::HubError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "grok";
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Grok,
    Claude,
    Gemini,
    OpenAI,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Grok,
        Provider::Claude,
        Provider::OpenAI,
        Provider::Gemini,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Claude => "Claude",
            Provider::Gemini => "Gemini",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Environment variables consulted for this provider's key, in priority order.
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Grok => &["GROK_API_KEY", "XAI_API_KEY"],
            Provider::Claude => &["ANTHROPIC_API_KEY"],
            Provider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Provider::OpenAI => &["OPENAI_API_KEY"],
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Grok => "https://api.x.ai/v1",
            Provider::Claude => "https://api.anthropic.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAI => "https://api.openai.com/v1",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A model the user can pick on the command line or as the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelChoice {
    Grok,
    Claude,
    Gemini,
    #[value(name = "gpt-4")]
    Gpt4,
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[value(name = "gpt-4o")]
    Gpt4o,
}

impl ModelChoice {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "grok" => Some(ModelChoice::Grok),
            "claude" => Some(ModelChoice::Claude),
            "gemini" => Some(ModelChoice::Gemini),
            "gpt-4" => Some(ModelChoice::Gpt4),
            "gpt-3.5-turbo" => Some(ModelChoice::Gpt35Turbo),
            "gpt-4o" => Some(ModelChoice::Gpt4o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Grok => "grok",
            ModelChoice::Claude => "claude",
            ModelChoice::Gemini => "gemini",
            ModelChoice::Gpt4 => "gpt-4",
            ModelChoice::Gpt35Turbo => "gpt-3.5-turbo",
            ModelChoice::Gpt4o => "gpt-4o",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ModelChoice::Grok => Provider::Grok,
            ModelChoice::Claude => Provider::Claude,
            ModelChoice::Gemini => Provider::Gemini,
            ModelChoice::Gpt4 | ModelChoice::Gpt35Turbo | ModelChoice::Gpt4o => Provider::OpenAI,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted part of the configuration, as stored in the YAML file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grok_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ConfigData {
    fn api_key(&self, provider: Provider) -> Option<&String> {
        match provider {
            Provider::Grok => self.grok_api_key.as_ref(),
            Provider::Claude => self.claude_api_key.as_ref(),
            Provider::Gemini => self.gemini_api_key.as_ref(),
            Provider::OpenAI => self.openai_api_key.as_ref(),
        }
    }

    fn api_key_mut(&mut self, provider: Provider) -> &mut Option<String> {
        match provider {
            Provider::Grok => &mut self.grok_api_key,
            Provider::Claude => &mut self.claude_api_key,
            Provider::Gemini => &mut self.gemini_api_key,
            Provider::OpenAI => &mut self.openai_api_key,
        }
    }
}

/// Configuration store: file-backed values with environment overrides.
///
/// The environment is captured once when the store is built; later changes
/// to the process environment are not observed.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    data: ConfigData,
    env: HashMap<String, String>,
    load_warning: Option<String>,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ai-hub")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Loads the configuration from `path` (or the default location) using
    /// the current process environment.
    pub fn load(path: Option<PathBuf>) -> Config {
        let env = Provider::ALL
            .iter()
            .flat_map(|p| p.env_vars().iter())
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self::load_with_env(path.unwrap_or_else(Self::default_path), env)
    }

    /// Loads the configuration from `path` resolving keys against `env`.
    ///
    /// Never fails: an unreadable or malformed file yields an empty
    /// configuration and a warning available through [`Config::load_warning`].
    pub fn load_with_env(path: PathBuf, env: HashMap<String, String>) -> Config {
        let (data, load_warning) = match Self::read_data(&path) {
            Ok(data) => (data, None),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config load failed, using defaults");
                let warning = format!("Could not load config file {}: {}", path.display(), e);
                (ConfigData::default(), Some(warning))
            }
        };

        Config {
            path,
            data,
            env,
            load_warning,
        }
    }

    fn read_data(path: &Path) -> Result<ConfigData, HubError> {
        if !path.exists() {
            return Ok(ConfigData::default());
        }
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(ConfigData::default());
        }
        let data = serde_yml::from_str::<ConfigData>(&contents)
            .map_err(|e| HubError::Config(format!("Parse {}: {}", path.display(), e)))?;
        Ok(data)
    }

    pub fn save(&self) -> Result<(), HubError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(&self.data)?;
        fs::write(&self.path, yaml_content)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Whether the configuration file is present on disk.
    pub fn config_exists(&self) -> io::Result<bool> {
        self.path.try_exists()
    }

    /// Resolves a provider key: environment aliases first, then the file.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        provider
            .env_vars()
            .iter()
            .filter_map(|name| self.env.get(*name))
            .chain(self.data.api_key(provider))
            .find(|value| !value.is_empty())
            .cloned()
    }

    pub fn has_api_key(&self, provider: Provider) -> bool {
        self.api_key(provider).is_some()
    }

    pub fn has_any_api_key(&self) -> bool {
        Provider::ALL.iter().any(|p| self.has_api_key(*p))
    }

    pub fn default_model(&self) -> &str {
        self.data.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.data.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn temperature(&self) -> f32 {
        self.data.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.data.system_prompt.as_deref()
    }

    pub fn set_api_key(&mut self, provider: Provider, key: &str) -> Result<(), HubError> {
        *self.data.api_key_mut(provider) = Some(key.to_string());
        self.save()
    }

    pub fn set_default_model(&mut self, model: ModelChoice) -> Result<(), HubError> {
        self.data.default_model = Some(model.as_str().to_string());
        self.save()
    }
}
