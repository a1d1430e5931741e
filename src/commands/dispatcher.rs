use super::{
    CommandContext, CommandOutcome,
    handler::{
        ClearCommand, CompactCommand, ConfigCommand, CostCommand, DoctorCommand, ExportCommand,
        HelpCommand, HistoryCommand, ModelCommand, QuitCommand, SetupCommand, SystemCommand,
        print_help,
    },
    parse_command,
    registry::CommandRegistry,
};
use crate::core::error::HubError;
use crate::display;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Runs one `/command` line. Unknown commands print an error followed
    /// by the help text and leave the session untouched.
    pub async fn execute(
        &self,
        line: &str,
        ctx: &mut CommandContext<'_>,
    ) -> Result<CommandOutcome, HubError> {
        let Some(parsed) = parse_command(line) else {
            return Ok(CommandOutcome::Continue);
        };

        match self.registry.get(&parsed.name) {
            Some(handler) => {
                tracing::debug!(command = %parsed.name, "running command");
                handler.execute(ctx, parsed.argument).await
            }
            None => {
                let shown = line.split_whitespace().next().unwrap_or(line);
                display::print_error(ctx.out, &format!("Unknown command: {}", shown))?;
                print_help(ctx)?;
                Ok(CommandOutcome::Continue)
            }
        }
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register_aliases(&["exit", "quit"], QuitCommand);
    registry.register("help", HelpCommand);
    registry.register("clear", ClearCommand);
    registry.register("history", HistoryCommand);
    registry.register("system", SystemCommand);
    registry.register("model", ModelCommand);
    registry.register("setup", SetupCommand);
    registry.register("config", ConfigCommand);
    registry.register("cost", CostCommand);
    registry.register("export", ExportCommand);
    registry.register("doctor", DoctorCommand);
    registry.register("compact", CompactCommand);

    CommandDispatcher::new(Arc::new(registry))
}
