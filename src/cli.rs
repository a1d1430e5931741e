use crate::config::ModelChoice;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hub",
    author,
    version,
    about = "AI Hub - one terminal for Grok, Claude, Gemini and OpenAI",
    long_about = None
)]
pub struct Args {
    /// AI model to use (defaults to the configured default model)
    #[arg(short, long, value_enum)]
    pub model: Option<ModelChoice>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start interactive mode
    #[arg(short, long)]
    pub interactive: bool,

    /// Setup API keys and configuration
    #[arg(long)]
    pub setup: bool,

    /// Log filter written to stderr, e.g. `debug` or `hub=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// The prompt to send to the AI model
    pub prompt: Vec<String>,
}

impl Args {
    /// Interactive mode is the default when no prompt words were given.
    pub fn wants_interactive(&self) -> bool {
        self.interactive || self.prompt.is_empty()
    }

    pub fn joined_prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_is_interactive() {
        let args = Args::try_parse_from(["hub"]).unwrap();
        assert!(args.wants_interactive());
        assert!(args.model.is_none());
    }

    #[test]
    fn prompt_words_select_one_shot() {
        let args = Args::try_parse_from(["hub", "-m", "gpt-4o", "what", "is", "rust"]).unwrap();
        assert!(!args.wants_interactive());
        assert_eq!(args.model, Some(ModelChoice::Gpt4o));
        assert_eq!(args.joined_prompt(), "what is rust");
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Args::try_parse_from(["hub", "--model", "llama"]).is_err());
    }
}
