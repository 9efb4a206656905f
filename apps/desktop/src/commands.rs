//! Prompt commands typed by the user.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Chat(String),
    Analyze(PathBuf),
    History,
    Analyses,
    State,
    Help,
    Quit,
}

impl UiCommand {
    pub fn name(&self) -> &'static str {
        match self {
            UiCommand::Chat(_) => "send_message",
            UiCommand::Analyze(_) => "analyze",
            UiCommand::History => "load_history",
            UiCommand::Analyses => "analysis_history",
            UiCommand::State => "state",
            UiCommand::Help => "help",
            UiCommand::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '/{0}'; type /help for the list")]
    Unknown(String),
    #[error("usage: /analyze <path-to-chart-image>")]
    MissingPath,
}

/// Blank lines parse to `None`. Anything not starting with `/` is chat text.
pub fn parse_command(line: &str) -> Result<Option<UiCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(UiCommand::Chat(line.to_string())));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "analyze" | "upload" => {
            if argument.is_empty() {
                return Err(CommandError::MissingPath);
            }
            UiCommand::Analyze(PathBuf::from(strip_quotes(argument)))
        }
        "history" => UiCommand::History,
        "analyses" => UiCommand::Analyses,
        "state" => UiCommand::State,
        "help" | "?" => UiCommand::Help,
        "quit" | "exit" => UiCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn strip_quotes(argument: &str) -> &str {
    argument
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(argument)
}
