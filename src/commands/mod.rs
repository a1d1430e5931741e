pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::config::Config;
use crate::input::InputSource;
use crate::providers::LLMProvider;
use crate::session::Session;
use std::io::Write;
use std::path::Path;

pub use dispatcher::{CommandDispatcher, create_command_registry};

/// What the interactive loop does after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// Everything a command handler may read or change.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub provider: &'a dyn LLMProvider,
    pub config: &'a mut Config,
    pub input: &'a mut dyn InputSource,
    pub out: &'a mut dyn Write,
    pub export_dir: &'a Path,
}

/// A `/command` split into its lowercased name and optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: String,
    pub argument: Option<&'a str>,
}

/// Splits a command line at the first space. Returns `None` for lines that
/// are not commands.
pub fn parse_command(line: &str) -> Option<ParsedCommand<'_>> {
    let line = line.trim();
    let rest = line.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let name = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    Some(ParsedCommand { name, argument })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_argument() {
        let parsed = parse_command("  /SYSTEM You are Terse  ").unwrap();
        assert_eq!(parsed.name, "system");
        assert_eq!(parsed.argument, Some("You are Terse"));
    }

    #[test]
    fn bare_command_has_no_argument() {
        let parsed = parse_command("/compact ").unwrap();
        assert_eq!(parsed.name, "compact");
        assert_eq!(parsed.argument, None);
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert!(parse_command("hello /help").is_none());
    }
}
