use super::{CommandContext, CommandOutcome};
use crate::config::{Provider, setup};
use crate::core::error::HubError;
use crate::display;
use crate::session::format_duration;

use async_trait::async_trait;
use std::io::Write;

const DEFAULT_COMPACT_INSTRUCTIONS: &str = "Summarize our conversation";
const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes conversations concisely.";

#[async_trait(?Send)]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError>;

    fn help(&self) -> &'static str;
}

pub struct QuitCommand;
pub struct HelpCommand;
pub struct ClearCommand;
pub struct HistoryCommand;
pub struct SystemCommand;
pub struct ModelCommand;
pub struct SetupCommand;
pub struct ConfigCommand;
pub struct CostCommand;
pub struct ExportCommand;
pub struct DoctorCommand;
pub struct CompactCommand;

/// Every command's help line, in display order.
pub fn help_text() -> String {
    [
        ClearCommand.help(),
        CompactCommand.help(),
        ConfigCommand.help(),
        CostCommand.help(),
        DoctorCommand.help(),
        QuitCommand.help(),
        ExportCommand.help(),
        HelpCommand.help(),
        HistoryCommand.help(),
        ModelCommand.help(),
        SetupCommand.help(),
        SystemCommand.help(),
    ]
    .join("\n")
}

pub fn print_help(ctx: &mut CommandContext<'_>) -> Result<(), HubError> {
    writeln!(ctx.out)?;
    writeln!(ctx.out, "{}", help_text())?;
    writeln!(ctx.out)?;
    Ok(())
}

#[async_trait(?Send)]
impl CommandHandler for QuitCommand {
    async fn execute(
        &self,
        _ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        Ok(CommandOutcome::Exit)
    }

    fn help(&self) -> &'static str {
        "/exit (quit)               Exit the REPL"
    }
}

#[async_trait(?Send)]
impl CommandHandler for HelpCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        print_help(ctx)?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/help                      Show help and available commands"
    }
}

#[async_trait(?Send)]
impl CommandHandler for ClearCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        display::clear_screen(ctx.out)?;
        ctx.session.clear();
        display::print_info(ctx.out, "Conversation history cleared")?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/clear                     Clear conversation history and free up context"
    }
}

#[async_trait(?Send)]
impl CommandHandler for HistoryCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        if ctx.session.history().is_empty() {
            display::print_info(ctx.out, "No conversation history")?;
            return Ok(CommandOutcome::Continue);
        }

        display::print_info(ctx.out, "\nConversation History:")?;
        for line in ctx.session.history_lines() {
            writeln!(ctx.out, "{}", line)?;
        }
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/history                   Show conversation history"
    }
}

#[async_trait(?Send)]
impl CommandHandler for SystemCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        match argument {
            Some(prompt) => {
                ctx.session.set_system_prompt(prompt);
                display::print_info(ctx.out, &format!("System prompt set: {}", prompt))?;
            }
            None => {
                let current = ctx.session.system_prompt().unwrap_or("None");
                display::print_info(ctx.out, &format!("Current system prompt: {}", current))?;
            }
        }
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/system [prompt]           Set or view system prompt"
    }
}

#[async_trait(?Send)]
impl CommandHandler for ModelCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        display::print_info(ctx.out, &format!("Current model: {}", ctx.provider.model_name()))?;
        display::print_info(ctx.out, &format!("Max tokens: {}", ctx.provider.max_tokens()))?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/model                     Show current model info"
    }
}

#[async_trait(?Send)]
impl CommandHandler for SetupCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        display::print_bold(ctx.out, "\n🔧 API Keys Setup")?;
        display::print_info(ctx.out, "Configure your API keys")?;
        writeln!(ctx.out)?;

        setup::configure_api_keys(ctx.config, ctx.input, ctx.out)?;

        display::print_info(ctx.out, "Configuration updated! Restart to use new keys.")?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/setup                     Configure API keys"
    }
}

#[async_trait(?Send)]
impl CommandHandler for ConfigCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        let config = &*ctx.config;
        display::print_bold(ctx.out, "\n⚙️ Configuration")?;
        writeln!(ctx.out, "Config file: {}", config.path().display())?;
        writeln!(ctx.out, "Default model: {}", config.default_model())?;
        for provider in Provider::ALL {
            writeln!(
                ctx.out,
                "{} API key: {}",
                provider,
                display::status_mark(config.has_api_key(provider))
            )?;
        }
        writeln!(ctx.out, "Max tokens: {}", config.max_tokens())?;
        writeln!(ctx.out, "Temperature: {}", config.temperature())?;
        writeln!(ctx.out, "System prompt: {}", config.system_prompt().unwrap_or("None"))?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/config                    Show current configuration"
    }
}

#[async_trait(?Send)]
impl CommandHandler for CostCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        display::print_bold(ctx.out, "\n💰 Session Info")?;
        writeln!(ctx.out, "Duration: {}", format_duration(ctx.session.elapsed()))?;
        writeln!(ctx.out, "Messages: {}", ctx.session.history().len())?;
        writeln!(ctx.out, "Model: {}", ctx.provider.model_name())?;
        writeln!(ctx.out, "Note: Actual API costs depend on your provider's pricing")?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/cost                      Show the total cost and duration of the current session"
    }
}

#[async_trait(?Send)]
impl CommandHandler for ExportCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        if ctx.session.history().is_empty() {
            display::print_info(ctx.out, "No conversation to export")?;
            return Ok(CommandOutcome::Continue);
        }

        match ctx.session.export_to(ctx.export_dir, ctx.provider.model_name()) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "conversation exported");
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                display::print_info(ctx.out, &format!("✓ Conversation exported to: {}", name))?;
            }
            Err(e) => display::print_error(ctx.out, &format!("Export failed: {}", e))?,
        }
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/export                    Export the current conversation to a JSON file"
    }
}

#[async_trait(?Send)]
impl CommandHandler for DoctorCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        display::print_bold(ctx.out, "\n🩺 AI Hub Health Check")?;

        for provider in Provider::ALL {
            if ctx.config.has_api_key(provider) {
                writeln!(ctx.out, "✓ {} API key configured", provider)?;
            } else {
                writeln!(ctx.out, "✗ {} API key missing", provider)?;
            }
        }

        match ctx.config.config_exists() {
            Ok(true) => writeln!(ctx.out, "✓ Config file exists")?,
            Ok(false) => writeln!(ctx.out, "✗ Config file missing")?,
            Err(e) => {
                tracing::warn!(error = %e, "config file check failed");
                writeln!(ctx.out, "✗ Config file check failed")?
            }
        }

        writeln!(ctx.out, "✓ Current model: {}", ctx.provider.model_name())?;
        writeln!(ctx.out, "✓ CLI is operational")?;
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/doctor                    Checks the health of your AI Hub installation"
    }
}

#[async_trait(?Send)]
impl CommandHandler for CompactCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        argument: Option<&str>,
    ) -> Result<CommandOutcome, HubError> {
        if ctx.session.history().is_empty() {
            display::print_info(ctx.out, "No conversation to compact")?;
            return Ok(CommandOutcome::Continue);
        }

        display::print_info(ctx.out, "Compacting conversation with AI summary...")?;

        let instructions = argument.unwrap_or(DEFAULT_COMPACT_INSTRUCTIONS);
        let prompt = format!(
            "{}\n\nConversation to summarize:\n{}",
            instructions,
            ctx.session.transcript()
        );

        match ctx.provider.chat(&prompt, Some(SUMMARY_SYSTEM_PROMPT)).await {
            Ok(summary) => {
                ctx.session.replace_with_summary(summary);
                display::print_info(ctx.out, "✓ Conversation compacted with AI summary")?;
            }
            Err(e) => display::print_error(ctx.out, &format!("Compact failed: {}", e))?,
        }
        Ok(CommandOutcome::Continue)
    }

    fn help(&self) -> &'static str {
        "/compact [instructions]    Clear conversation history but keep a summary in context"
    }
}
