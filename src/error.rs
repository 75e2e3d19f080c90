//! Error types for Lexi
//!
//! This module defines the error types used outside the dispatch core,
//! using `thiserror` for ergonomic error handling. The query dispatcher never
//! surfaces these: transport and parse failures become fallback answers.

use thiserror::Error;

/// Main error type for Lexi operations
///
/// Covers configuration loading, answering service access, citation lookups
/// and terminal I/O.
#[derive(Error, Debug)]
pub enum LexiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Answering service errors (connection, status, malformed body)
    #[error("Answering service error: {0}")]
    Service(String),

    /// No message with the given id exists in the conversation
    #[error("Message not found: {0}")]
    MessageNotFound(u64),

    /// A citation marker does not address a citation of its message
    #[error("Citation [{marker}] not found on message {message_id}")]
    CitationNotFound {
        /// Id of the message the marker was resolved against
        message_id: u64,
        /// The 1-based marker that was requested
        marker: usize,
    },

    /// The question was empty after trimming
    #[error("Question is empty")]
    EmptyQuestion,

    /// There is no assistant message with citations to resolve a marker against
    #[error("No assistant answer with citations yet")]
    NoCitations,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for Lexi operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`LexiError`].
pub type Result<T> = anyhow::Result<T>;
