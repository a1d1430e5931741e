use crate::config::Provider;
use std::io;
use thiserror::Error;

/// Unified error type for the hub application
#[derive(Error, Debug)]
pub enum HubError {
    /// API-related errors returned by a provider endpoint
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Any failure of a provider call, tagged with the provider that failed
    #[error("{provider} API error: {message}")]
    Provider { provider: Provider, message: String },

    /// Unknown or unexpected errors
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl HubError {
    /// Wraps this error with the identity of the provider it came from.
    ///
    /// Classified errors contribute only their payload, so the message reads
    /// `Grok API error: reset` rather than repeating a category. Already
    /// tagged errors are returned unchanged.
    pub fn for_provider(self, provider: Provider) -> HubError {
        let message = match self {
            tagged @ HubError::Provider { .. } => return tagged,
            HubError::Api(message)
            | HubError::Config(message)
            | HubError::Input(message)
            | HubError::Serialization(message)
            | HubError::Network(message)
            | HubError::Unknown(message) => message,
            HubError::Io { source } => source.to_string(),
        };
        HubError::Provider { provider, message }
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HubError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            HubError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            HubError::Api(format!("API returned error status: {}", err))
        } else {
            HubError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for HubError {
    fn from(err: serde_yml::Error) -> Self {
        HubError::Serialization(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tag_prefixes_message() {
        let err = HubError::Api("401 Unauthorized".to_string()).for_provider(Provider::Claude);
        assert_eq!(err.to_string(), "Claude API error: 401 Unauthorized");
    }

    #[test]
    fn provider_tag_is_not_applied_twice() {
        let err = HubError::Network("reset".to_string())
            .for_provider(Provider::Grok)
            .for_provider(Provider::OpenAI);
        assert_eq!(err.to_string(), "Grok API error: reset");
    }

    #[test]
    fn io_failure_is_tagged_with_its_description() {
        let io = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err = HubError::from(io).for_provider(Provider::Gemini);
        assert_eq!(err.to_string(), "Gemini API error: pipe closed");
    }
}
