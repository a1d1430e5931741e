use console::style;
use std::io::{self, Write};

pub fn print_info(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", style(text).blue())
}

pub fn print_error(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", style(format!("Error: {}", text)).red())
}

pub fn print_bold(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", style(text).bold())
}

pub fn print_dim(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", style(text).dim())
}

pub fn print_response(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", style(text).green())
}

/// Check mark or cross for a yes/no status line.
pub fn status_mark(ok: bool) -> &'static str {
    if ok { "✓ Set" } else { "✗ Not set" }
}

/// The input prompt shown before every line.
pub fn prompt() -> String {
    if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
        "> ".to_string()
    } else {
        style("> ").dim().to_string()
    }
}

pub fn clear_screen(out: &mut dyn Write) -> io::Result<()> {
    write!(out, "\x1b[2J\x1b[1;1H")?;
    out.flush()
}

/// Writes one streamed chunk immediately.
pub fn write_chunk(out: &mut dyn Write, chunk: &str) -> io::Result<()> {
    write!(out, "{}", chunk)?;
    out.flush()
}

pub fn print_welcome(out: &mut dyn Write, model: &str) -> io::Result<()> {
    writeln!(out, "╭───────────────────────────────────────────────────╮")?;
    writeln!(out, "│ {} │", style("✻ Welcome to AI Hub!                             ").bold())?;
    writeln!(out, "│                                                   │")?;
    writeln!(out, "│   /help for help, /config for configuration       │")?;
    writeln!(out, "│                                                   │")?;
    writeln!(out, "│   model: {:<40} │", model)?;
    writeln!(out, "╰───────────────────────────────────────────────────╯")?;
    writeln!(out)?;
    writeln!(out, " Tips for getting started:")?;
    writeln!(out)?;
    writeln!(out, " 1. Type /help to see all available commands")?;
    writeln!(out, " 2. Use /setup to configure API keys")?;
    writeln!(out, " 3. Use /config to view current configuration")?;
    writeln!(out, " 4. Type your questions directly or use slash commands")?;
    writeln!(out)?;
    print_dim(out, " ? for shortcuts")
}

fn looks_like_markdown(text: &str) -> bool {
    text.contains('*') || text.contains('`') || text.contains('#')
}

/// Renders a one-shot answer, using terminal markdown when it looks like markdown.
pub fn display_answer(out: &mut dyn Write, response: &str) -> io::Result<()> {
    if looks_like_markdown(response) {
        let skin = termimad::MadSkin::default();
        write!(out, "{}", skin.term_text(response))?;
        out.flush()
    } else {
        print_response(out, response)
    }
}
