//! Conversation module for Lexi
//!
//! This module contains the client-side conversation model: messages and
//! their citations, the append-only conversation state machine, and the
//! citation detail overlay.

pub mod citation;
pub mod message;
pub mod modal;
pub mod state_machine;

pub use citation::{Citation, CitationStore};
pub use message::{Clock, FixedClock, Message, Role, SystemClock};
pub use modal::CitationModal;
pub use state_machine::{Conversation, ConversationState, PendingQuery, Submission};
