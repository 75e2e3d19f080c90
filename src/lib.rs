//! Lexi - Legal AI assistant library
//!
//! This library provides the core of the Lexi chat client: the conversation
//! log with inline citations, the query dispatcher that talks to the
//! answering service, and the chat session that ties them together.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `conversation`: Messages, citations, the conversation state machine and
//!   the citation overlay
//! - `dispatch`: Query dispatch with the reference answer and fallback path
//! - `service`: Answering service abstraction and its HTTP client
//! - `session`: Chat session controller publishing session events
//! - `render`: Terminal rendering of messages and citations
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use lexi::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let session = ChatSession::from_config(&config)?;
//!     if let Some(reply) = session.ask("Can a minor enter into a contract?").await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod render;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use config::{ConcurrencyPolicy, Config};
pub use conversation::{Citation, CitationStore, Conversation, Message, Role};
pub use dispatch::{AnswerOrigin, AnswerResult, QueryDispatcher};
pub use error::{LexiError, Result};
pub use service::{AnsweringService, HttpAnsweringService};
pub use session::{ChatSession, Reply, SessionEvent};
