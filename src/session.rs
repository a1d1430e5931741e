//! Conversation state for one interactive run.

use crate::core::error::HubError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// User field of the single turn that replaces history after compaction.
pub const SUMMARY_MARKER: &str = "[Previous conversation summary]";

/// Characters of an answer shown by the history listing.
pub const PREVIEW_CHARS: usize = 100;

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "user")]
    pub user_message: String,
    #[serde(rename = "assistant")]
    pub assistant_message: String,
}

impl Turn {
    pub fn new(user_message: impl Into<String>, assistant_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            assistant_message: assistant_message.into(),
        }
    }
}

/// Snapshot written by `/export`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub timestamp: String,
    pub model: String,
    #[serde(alias = "systemPrompt")]
    pub system_prompt: Option<String>,
    pub conversation: Vec<Turn>,
}

/// History, system prompt and timing of the running session.
///
/// `history` only ever holds fully received turns, in conversation order.
#[derive(Debug)]
pub struct Session {
    history: Vec<Turn>,
    system_prompt: Option<String>,
    started_at: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            system_prompt: None,
            started_at: Instant::now(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn record_turn(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The whole history as plain text, one `User:`/`AI:` block per turn.
    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|turn| format!("User: {}\nAI: {}\n\n", turn.user_message, turn.assistant_message))
            .collect()
    }

    /// Replaces the history with a single summary turn.
    pub fn replace_with_summary(&mut self, summary: String) {
        self.history = vec![Turn::new(SUMMARY_MARKER, summary)];
    }

    /// Numbered listing of the history with answers cut to a short preview.
    pub fn history_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.history.iter().enumerate().map(|(i, turn)| {
            format!(
                "\n{}. User: {}\n   AI: {}",
                i + 1,
                turn.user_message,
                preview(&turn.assistant_message)
            )
        })
    }

    pub fn export_document(&self, model: &str, now: DateTime<Local>) -> ExportDocument {
        ExportDocument {
            timestamp: now.to_rfc3339(),
            model: model.to_string(),
            system_prompt: self.system_prompt.clone(),
            conversation: self.history.clone(),
        }
    }

    /// Writes the export document into `dir` and returns the created path.
    ///
    /// The file name carries a timestamp; an existing file is never
    /// overwritten, a numeric suffix is added instead.
    pub fn export_to(&self, dir: &Path, model: &str) -> Result<PathBuf, HubError> {
        let now = Local::now();
        let document = self.export_document(model, now);
        let contents = serde_json::to_string_pretty(&document)?;
        let stem = format!("hub_conversation_{}", now.format("%Y%m%d_%H%M%S"));

        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(HubError::Unknown("no free export file name".to_string()))
    }
}

/// Cuts `text` to [`PREVIEW_CHARS`] characters, marking the cut with `...`.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
