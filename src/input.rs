use crate::core::error::HubError;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// One result of waiting for user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// The user pressed Ctrl-C while we were waiting.
    Interrupted,
    /// No more input will arrive (Ctrl-D or end of a pipe).
    Eof,
}

/// A blocking source of user input lines.
pub trait InputSource {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, HubError>;

    /// Reads a line without echoing it, for API keys.
    fn read_secret(&mut self, prompt: &str) -> Result<InputEvent, HubError> {
        self.read_line(prompt)
    }

    fn add_history(&mut self, _line: &str) {}

    /// Persists whatever history was collected. No-op by default.
    fn save_history(&mut self) -> Result<(), HubError> {
        Ok(())
    }
}

/// Completes `/` commands from a fixed list of names
pub struct CommandCompleter {
    commands: Vec<String>,
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') || pos == 0 || line[..pos].contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let command_part = &line[1..pos];
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(command_part))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((1, matches))
    }
}

/// Helper struct that combines all rustyline components
pub struct HubHelper {
    completer: CommandCompleter,
    hinter: HistoryHinter,
}

impl HubHelper {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            completer: CommandCompleter { commands },
            hinter: HistoryHinter {},
        }
    }
}

impl Helper for HubHelper {}

impl Completer for HubHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for HubHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for HubHelper {}

impl Validator for HubHelper {}

/// Interactive terminal input backed by rustyline.
pub struct EditorInput {
    editor: Editor<HubHelper, FileHistory>,
    history_path: PathBuf,
}

impl EditorInput {
    pub fn new(commands: Vec<String>, history_path: PathBuf) -> Result<Self, HubError> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)
            .map_err(|e| HubError::Input(format!("Failed to create line editor: {}", e)))?;
        editor.set_helper(Some(HubHelper::new(commands)));
        let _ = editor.load_history(&history_path);

        Ok(Self {
            editor,
            history_path,
        })
    }
}

impl InputSource for EditorInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, HubError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(error = %e, "discarding undecodable input line");
                Ok(InputEvent::Line(String::new()))
            }
            Err(err) => Err(HubError::Input(format!("Input error: {}", err))),
        }
    }

    fn read_secret(&mut self, prompt: &str) -> Result<InputEvent, HubError> {
        let term = console::Term::stdout();
        term.write_str(prompt)?;
        match term.read_secure_line() {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(InputEvent::Interrupted),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(InputEvent::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            tracing::debug!(error = %e, "failed to add history entry");
        }
    }

    fn save_history(&mut self) -> Result<(), HubError> {
        if let Some(parent) = self.history_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HubError::Input(format!("Failed to create history directory: {}", e))
                })?;
            }
        }

        self.editor
            .save_history(&self.history_path)
            .map_err(|e| HubError::Input(format!("Failed to save history: {}", e)))
    }
}

/// Line input over any buffered reader, used when stdin is not a terminal.
///
/// Prompts are written to `prompt_out` so piped sessions still show where
/// each answer begins.
pub struct LineInput<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> LineInput<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> InputSource for LineInput<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, HubError> {
        write!(self.prompt_out, "{}", prompt)?;
        self.prompt_out.flush()?;

        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(InputEvent::Eof);
        }
        let line = String::from_utf8_lossy(&raw);
        Ok(InputEvent::Line(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}
