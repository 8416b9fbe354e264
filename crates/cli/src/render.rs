//! Terminal rendering of agent progress.

use colored::Colorize;
use termagent_agent::{StepEvent, StepSink};

/// Longest tool output echoed to the terminal. The model still sees all of it.
const TOOL_OUTPUT_PREVIEW: usize = 400;

/// Prints step events to stdout as they arrive.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl StepSink for TerminalRenderer {
    fn emit(&self, event: StepEvent) {
        match event {
            StepEvent::Thinking { content } => {
                println!("{} {}", "🧠".dimmed(), content.dimmed());
            }
            StepEvent::Observing { content } => {
                println!("{} {}", "👀".dimmed(), content.dimmed());
            }
            StepEvent::ToolCall { tool, input } => {
                println!("{} {}({})", "🔧".yellow(), tool.yellow().bold(), input);
            }
            StepEvent::ToolResult {
                output, success, ..
            } => {
                let preview = truncate(&output, TOOL_OUTPUT_PREVIEW);
                if success {
                    println!("{} {}", "  ↳".green(), preview);
                } else {
                    println!("{} {}", "  ↳".red(), preview.red());
                }
            }
            StepEvent::ModelFallback {
                from, to, status, ..
            } => {
                let status = status.map_or_else(String::new, |s| format!(" ({s})"));
                println!(
                    "{} {}{} unavailable, switching to {}",
                    "⚠".yellow(),
                    from.yellow(),
                    status,
                    to.yellow().bold()
                );
            }
            StepEvent::Warning { message } => {
                println!("{} {}", "⚠".yellow(), message.yellow());
            }
            StepEvent::Answer { content, model } => {
                println!();
                println!("{} {}", "🤖".bright_blue(), content.bold());
                println!("{}", right_align(&model, terminal_width()).dimmed());
            }
            StepEvent::Aborted {
                reason,
                hint,
                last_message,
            } => {
                println!("{} {}", "✖".red(), reason.red());
                if let Some(hint) = hint {
                    println!("  {}", hint.dimmed());
                }
                if let Some(message) = last_message {
                    println!("  {}", last_message_line(&message).dimmed());
                }
            }
        }
    }
}

pub fn banner(models: &[String]) {
    println!();
    println!("{}", "termagent".bright_blue().bold());
    println!("{} {}", "Models:".dimmed(), models.join(", "));
    println!(
        "{}",
        "Type a query and press Enter. 'exit', 'quit' or 'q' to leave.".dimmed()
    );
    println!();
}

pub fn prompt() {
    use std::io::Write;
    print!("{} ", ">".bright_cyan().bold());
    let _ = std::io::stdout().flush();
}

pub fn empty_query() {
    println!("{}", "Please enter a valid query.".yellow());
}

pub fn goodbye() {
    println!("{}", "👋 Goodbye!".bright_blue());
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| usize::from(w))
        .unwrap_or(80)
}

fn last_message_line(message: &str) -> String {
    format!("Last message sent to API: {}", truncate(message, 200))
}

/// Pad `text` on the left so it ends at column `width`.
fn right_align(text: &str, width: usize) -> String {
    format!("{text:>width$}")
}

/// Cut `text` to at most `max` characters, marking the cut.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
