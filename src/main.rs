use clap::Parser;
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod providers;
mod session;
#[cfg(test)]
mod testing;

use crate::app::Application;
use crate::cli::Args;
use crate::commands::create_command_registry;
use crate::config::{Config, ModelChoice, setup};
use crate::core::error::HubError;
use crate::input::{EditorInput, InputSource, LineInput};
use crate::providers::factory::ProviderFactory;
use crate::session::Session;

const DEFAULT_LOG_FILTER: &str = "hub=warn";

/// `RUST_LOG` (or the default filter) plus the `--log-level` directive.
/// Returns a warning when that directive does not parse.
fn log_filter(level: Option<&str>) -> (EnvFilter, Option<String>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let Some(level) = level else {
        return (filter, None);
    };
    match level.parse::<Directive>() {
        Ok(directive) => (filter.add_directive(directive), None),
        Err(e) => (
            filter,
            Some(format!("Ignoring invalid --log-level '{}': {}", level, e)),
        ),
    }
}

fn init_logging(level: Option<&str>) {
    let (filter, warning) = log_filter(level);
    if let Some(warning) = warning {
        let _ = display::print_error(&mut io::stderr(), &warning);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Explicit `--model` wins, then the configured default, then Grok.
fn resolve_model(args: &Args, config: &Config) -> ModelChoice {
    args.model.unwrap_or_else(|| {
        ModelChoice::from_str(config.default_model()).unwrap_or_else(|| {
            tracing::warn!(model = config.default_model(), "unknown default model, using grok");
            ModelChoice::Grok
        })
    })
}

fn open_input(commands: Vec<String>) -> Result<Box<dyn InputSource>, HubError> {
    if io::stdin().is_terminal() {
        let history_path = Config::config_dir().join("input_history.txt");
        Ok(Box::new(EditorInput::new(commands, history_path)?))
    } else {
        Ok(Box::new(LineInput::new(io::stdin().lock(), io::stdout())))
    }
}

async fn run(args: Args) -> Result<ExitCode, HubError> {
    let mut out = io::stdout();
    let mut config = Config::load(args.config.clone());
    if let Some(warning) = config.load_warning() {
        display::print_error(&mut out, warning)?;
    }

    let dispatcher = create_command_registry();
    let mut input = open_input(dispatcher.get_command_names())?;

    if args.setup {
        setup::run_setup(&mut config, input.as_mut(), &mut out)?;
        return Ok(ExitCode::SUCCESS);
    }

    if !config.has_any_api_key() {
        if !setup::first_time_setup(&mut config, input.as_mut(), &mut out)? {
            return Ok(ExitCode::FAILURE);
        }
        config = Config::load(args.config.clone());
    }

    let model = resolve_model(&args, &config);
    tracing::info!(%model, "selected model");
    let provider = match ProviderFactory::new().create(model, &config) {
        Ok(provider) => provider,
        Err(e) => {
            display::print_error(&mut out, &e.to_string())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let export_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut app = Application::new(config, provider, dispatcher, export_dir);

    if !args.wants_interactive() {
        let prompt = args.joined_prompt();
        if prompt.trim().is_empty() {
            display::print_error(&mut out, "Please provide a prompt or use --interactive mode")?;
            return Ok(ExitCode::FAILURE);
        }
        return match app.run_once(&prompt, &mut out).await {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                display::print_error(&mut out, &e.to_string())?;
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let mut session = Session::new();
    app.run_interactive(&mut session, input.as_mut(), &mut out)
        .await?;
    if let Err(e) = input.save_history() {
        tracing::warn!(error = %e, "could not save input history");
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            let _ = display::print_error(&mut io::stderr(), &e.to_string());
            ExitCode::FAILURE
        }
    }
}
