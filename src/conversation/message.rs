//! Conversation turns and the clock that timestamps them

use super::citation::CitationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The answering service
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in the conversation log
///
/// Messages are immutable once appended. Assistant text may carry emphasis
/// markup (`**bold**`, `*italic*`) and bullet glyphs; these are stored
/// verbatim and interpreted only when rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, strictly increasing id within the conversation
    pub id: u64,
    /// Who authored the turn
    pub role: Role,
    /// Raw message text
    pub text: String,
    /// Creation time, display only
    pub timestamp: DateTime<Utc>,
    /// Supporting citations; always empty for user turns
    #[serde(default)]
    pub citations: CitationStore,
}

impl Message {
    /// Creates a user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use lexi::conversation::{Message, Role};
    ///
    /// let msg = Message::user(1, "Is an oral will valid?", Utc::now());
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.citations.is_empty());
    /// ```
    pub fn user(id: u64, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            timestamp,
            citations: CitationStore::new(),
        }
    }

    /// Creates an assistant turn with its citations
    pub fn assistant(
        id: u64,
        text: impl Into<String>,
        citations: CitationStore,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: text.into(),
            timestamp,
            citations,
        }
    }

    /// Returns true for user turns
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns true for assistant turns
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Source of message timestamps
///
/// Injected into the conversation so tests can pin time.
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
