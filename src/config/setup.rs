//! Interactive API key setup.

use crate::config::{Config, ModelChoice, Provider};
use crate::core::error::HubError;
use crate::display;
use crate::input::{InputEvent, InputSource};
use std::io::Write;

/// Asks a question and returns the trimmed answer; interruption or end of
/// input count as an empty answer.
fn ask(input: &mut dyn InputSource, question: &str) -> Result<String, HubError> {
    match input.read_line(question)? {
        InputEvent::Line(line) => Ok(line.trim().to_string()),
        InputEvent::Interrupted | InputEvent::Eof => Ok(String::new()),
    }
}

fn ask_secret(input: &mut dyn InputSource, question: &str) -> Result<String, HubError> {
    match input.read_secret(question)? {
        InputEvent::Line(line) => Ok(line.trim().to_string()),
        InputEvent::Interrupted | InputEvent::Eof => Ok(String::new()),
    }
}

fn is_yes(answer: &str) -> bool {
    answer.to_lowercase().starts_with('y')
}

/// Reads a key for `provider` and stores it. Returns whether a key was saved.
fn store_key(
    config: &mut Config,
    provider: Provider,
    input: &mut dyn InputSource,
    out: &mut dyn Write,
    saved_message: &str,
) -> Result<bool, HubError> {
    let key = ask_secret(input, &format!("Enter your {} API key: ", provider))?;
    if key.is_empty() {
        display::print_error(out, "No key entered")?;
        return Ok(false);
    }

    match config.set_api_key(provider, &key) {
        Ok(()) => {
            display::print_info(out, saved_message)?;
            Ok(true)
        }
        Err(e) => {
            display::print_error(out, &format!("Error saving config file: {}", e))?;
            Ok(false)
        }
    }
}

/// Offers to set the key of every provider, one `(y/N)` question each.
pub fn configure_api_keys(
    config: &mut Config,
    input: &mut dyn InputSource,
    out: &mut dyn Write,
) -> Result<(), HubError> {
    for provider in Provider::ALL {
        writeln!(
            out,
            "{} API Key: {}",
            provider,
            display::status_mark(config.has_api_key(provider))
        )?;

        let answer = ask(input, &format!("Configure {} API key? (y/N): ", provider))?;
        if is_yes(&answer) {
            store_key(config, provider, input, out, &format!("✓ {} API key saved", provider))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// The full `--setup` flow: keys, then an optional default model.
pub fn run_setup(
    config: &mut Config,
    input: &mut dyn InputSource,
    out: &mut dyn Write,
) -> Result<(), HubError> {
    display::print_bold(out, "🔧 AI Hub Setup")?;
    display::print_info(out, "Configure your API keys for multiple AI providers")?;
    writeln!(out)?;

    configure_api_keys(config, input, out)?;

    writeln!(out, "Current default model: {}", config.default_model())?;
    let answer = ask(input, "Change default model? (y/N): ")?;
    if is_yes(&answer) {
        let menu = [
            ModelChoice::Grok,
            ModelChoice::Claude,
            ModelChoice::Gpt4,
            ModelChoice::Gpt35Turbo,
            ModelChoice::Gemini,
        ];
        for (i, model) in menu.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, model)?;
        }
        let choice = ask(input, &format!("Choose (1-{}): ", menu.len()))?;
        if let Some(model) = pick(&menu, &choice) {
            save_default_model(config, model, out)?;
        }
    }

    writeln!(out)?;
    display::print_info(out, &format!("Configuration saved to: {}", config.path().display()))?;
    display::print_info(out, "You can now use: hub -i")?;
    Ok(())
}

/// Walks a new user through configuring at least one provider.
///
/// Returns `false` when no key was configured.
pub fn first_time_setup(
    config: &mut Config,
    input: &mut dyn InputSource,
    out: &mut dyn Write,
) -> Result<bool, HubError> {
    writeln!(out, "╭───────────────────────────────────────────────────╮")?;
    writeln!(out, "│ ✻ Welcome to AI Hub!                              │")?;
    writeln!(out, "│                                                   │")?;
    writeln!(out, "│   First time setup - Let's get you started!       │")?;
    writeln!(out, "╰───────────────────────────────────────────────────╯")?;
    writeln!(out)?;
    display::print_info(out, "AI Hub supports multiple AI providers. Let's configure at least one:")?;
    writeln!(out)?;

    let mut configured_any = false;
    for provider in Provider::ALL {
        let answer = ask(input, &format!("Configure {}? (Y/n): ", provider))?;
        if answer.to_lowercase() != "n" {
            let saved = store_key(config, provider, input, out, &format!("✓ {} configured!", provider))?;
            configured_any |= saved;
            writeln!(out)?;
        }
    }

    if !configured_any {
        display::print_error(out, "No API keys configured. You need at least one to use AI Hub.")?;
        display::print_info(out, "You can run 'hub --setup' later to configure API keys.")?;
        return Ok(false);
    }

    let available: Vec<ModelChoice> = [
        ModelChoice::Grok,
        ModelChoice::Claude,
        ModelChoice::Gpt4,
        ModelChoice::Gemini,
    ]
    .into_iter()
    .filter(|model| config.has_api_key(model.provider()))
    .collect();

    display::print_info(out, "Choose your default model:")?;
    for (i, model) in available.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, model)?;
    }
    let choice = ask(input, &format!("Choose default model (1-{}): ", available.len()))?;
    if let Some(model) = pick(&available, &choice) {
        save_default_model(config, model, out)?;
    }

    writeln!(out)?;
    display::print_info(out, "🎉 Setup complete! Starting AI Hub...")?;
    display::print_info(out, "You can always run 'hub --setup' to change settings.")?;
    writeln!(out)?;
    Ok(true)
}

fn pick(menu: &[ModelChoice], choice: &str) -> Option<ModelChoice> {
    let index: usize = choice.parse().ok()?;
    menu.get(index.checked_sub(1)?).copied()
}

fn save_default_model(config: &mut Config, model: ModelChoice, out: &mut dyn Write) -> Result<(), HubError> {
    match config.set_default_model(model) {
        Ok(()) => display::print_info(out, &format!("✓ Default model set to {}", model))?,
        Err(e) => display::print_error(out, &format!("Error saving config file: {}", e))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::LineInput;
    use std::collections::HashMap;
    use std::io::{self, Cursor};

    fn scripted(lines: &str) -> LineInput<Cursor<String>, io::Sink> {
        LineInput::new(Cursor::new(lines.to_string()), io::sink())
    }

    #[test]
    fn configure_keys_saves_only_accepted_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        // Grok: yes + key, Claude: no, OpenAI: yes + empty key, Gemini: no
        let mut input = scripted("y\ngrok-key\nn\ny\n\nn\n");
        let mut out = Vec::new();

        configure_api_keys(&mut config, &mut input, &mut out).unwrap();

        assert_eq!(config.api_key(Provider::Grok).as_deref(), Some("grok-key"));
        assert!(!config.has_api_key(Provider::Claude));
        assert!(!config.has_api_key(Provider::OpenAI));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Grok API key saved"));
        assert!(text.contains("No key entered"));
    }

    #[test]
    fn first_time_setup_picks_default_among_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        // Grok: n, Claude: enter key, OpenAI: n, Gemini: n, choose 1
        let mut input = scripted("n\n\nclaude-key\nn\nn\n1\n");
        let mut out = Vec::new();

        assert!(first_time_setup(&mut config, &mut input, &mut out).unwrap());
        assert_eq!(config.default_model(), "claude");
    }

    #[test]
    fn first_time_setup_without_keys_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        let mut input = scripted("n\nn\nn\nn\n");
        let mut out = Vec::new();
        assert!(!first_time_setup(&mut config, &mut input, &mut out).unwrap());
    }

    #[test]
    fn menu_choice_bounds() {
        let menu = [ModelChoice::Grok, ModelChoice::Claude];
        assert_eq!(pick(&menu, "2"), Some(ModelChoice::Claude));
        assert_eq!(pick(&menu, "0"), None);
        assert_eq!(pick(&menu, "3"), None);
        assert_eq!(pick(&menu, "x"), None);
    }
}
