//! Special commands parser for interactive chat
//!
//! Anything that is not a special command is sent to Lexi as a question.
//! Commands are prefixed with `/` and are case-insensitive. They let the
//! user:
//! - Open the citation behind a `[n]` marker, and close it again
//! - Review the conversation so far
//! - Check the session and the answering service
//! - Exit the session

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Open the citation behind marker `[marker]`
    ///
    /// Without a message id the most recent answer with citations is used.
    Cite {
        marker: usize,
        message_id: Option<u64>,
    },

    /// Close the citation details panel
    CloseCitation,

    /// Print the conversation so far
    History,

    /// Display session status
    ShowStatus,

    /// Probe the answering service
    Health,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a question.
    None,
}

const CITE_USAGE: &str = "/cite <n> [message_id]";

fn parse_cite(args: &str) -> Result<SpecialCommand, CommandError> {
    let mut parts = args.split_whitespace();
    let marker = match parts.next() {
        Some(raw) => raw
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<usize>()
            .map_err(|_| CommandError::UnsupportedArgument {
                command: "/cite".to_string(),
                arg: raw.to_string(),
            })?,
        None => {
            return Err(CommandError::MissingArgument {
                command: "/cite".to_string(),
                usage: CITE_USAGE.to_string(),
            })
        }
    };

    let message_id = match parts.next() {
        Some(raw) => Some(raw.trim_start_matches('#').parse::<u64>().map_err(|_| {
            CommandError::UnsupportedArgument {
                command: "/cite".to_string(),
                arg: raw.to_string(),
            }
        })?),
        None => None,
    };

    if let Some(extra) = parts.next() {
        return Err(CommandError::UnsupportedArgument {
            command: "/cite".to_string(),
            arg: extra.to_string(),
        });
    }

    Ok(SpecialCommand::Cite { marker, message_id })
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use lexi::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/cite 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::Cite { marker: 2, message_id: None });
///
/// let cmd = parse_special_command("Is a verbal lease binding?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Plain text is a question (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/cite" => parse_cite(""),
        input if input.starts_with("/cite ") => parse_cite(&input[6..]),

        "/close" => Ok(SpecialCommand::CloseCitation),
        input if input.starts_with("/close ") => Err(CommandError::UnsupportedArgument {
            command: "/close".to_string(),
            arg: input[7..].trim().to_string(),
        }),

        "/history" => Ok(SpecialCommand::History),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/health" => Ok(SpecialCommand::Health),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        input if input.starts_with('/') => {
            let cmd = input.split_whitespace().next().unwrap_or(input);
            Err(CommandError::UnknownCommand(cmd.to_string()))
        }

        _ => Ok(SpecialCommand::None),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Lexi Chat
==============================

CITATIONS:
  /cite <n>         - Show citation [n] of the latest answer with citations
  /cite <n> <id>    - Show citation [n] of message <id> (see /history)
  /close            - Close the citation details

SESSION INFORMATION:
  /history          - Show the conversation so far with message ids
  /status           - Show session status
  /health           - Check whether the answering service is ready
  /help             - Show this help message
  /?                - Same as /help

SESSION CONTROL:
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to Lexi as a question
  - End a line with \ to continue the question on the next line
"#
    );
}
