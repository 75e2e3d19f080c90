//! Conversation log and composing state
//!
//! The conversation owns the append-only message log, the input buffer, and
//! the "assistant is composing" indicator. It performs no I/O: `submit`
//! hands back a [`PendingQuery`] ticket and the caller feeds the dispatcher's
//! answer back through [`Conversation::on_dispatch_resolved`].
//!
//! # Invariants
//!
//! - Message ids start at 1 and each new id is the previous maximum plus one,
//!   shared between user and assistant turns.
//! - A user turn is always appended before the assistant turn answering it,
//!   because the answer can only be integrated with the ticket `submit`
//!   returned.
//! - The composing indicator is true exactly while at least one ticket is
//!   outstanding.

use super::message::{Clock, Message, SystemClock};
use crate::config::ConcurrencyPolicy;
use crate::dispatch::AnswerResult;
use std::fmt;
use std::sync::Arc;

/// Whether the conversation is waiting on the answering service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// No question is pending
    Idle,
    /// At least one dispatched question has not resolved yet
    AwaitingResponse,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingResponse => write!(f, "awaiting response"),
        }
    }
}

/// Ticket for a question that has been accepted and must be dispatched
///
/// Only [`Conversation::submit`] creates tickets, and resolving one consumes
/// it, so every accepted submission yields exactly one assistant turn.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingQuery {
    message_id: u64,
    question: String,
}

impl PendingQuery {
    /// Id of the user turn this ticket answers
    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    /// The trimmed question text to dispatch
    pub fn question(&self) -> &str {
        &self.question
    }
}

/// Outcome of a submission attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    /// Empty or whitespace-only input; nothing changed
    Ignored,
    /// Refused because a question is already pending and the policy is `reject`
    Rejected,
    /// The user turn was appended; dispatch the ticket
    Dispatched(PendingQuery),
}

/// The conversation state machine
pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    in_flight: usize,
    policy: ConcurrencyPolicy,
    clock: Arc<dyn Clock>,
}

impl Conversation {
    /// Creates an empty conversation using the system clock
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::config::ConcurrencyPolicy;
    /// use lexi::conversation::Conversation;
    ///
    /// let conversation = Conversation::new(ConcurrencyPolicy::Allow);
    /// assert!(conversation.is_empty());
    /// assert!(!conversation.is_composing());
    /// ```
    pub fn new(policy: ConcurrencyPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Creates an empty conversation with an injected clock
    pub fn with_clock(policy: ConcurrencyPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            in_flight: 0,
            policy,
            clock,
        }
    }

    /// Replaces the content of the input buffer
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Current content of the input buffer
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Submits the content of the input buffer
    pub fn submit_input(&mut self) -> Submission {
        let raw = std::mem::take(&mut self.input);
        let submission = self.submit(&raw);
        if !matches!(submission, Submission::Dispatched(_)) {
            // Nothing was sent, so the user keeps what they typed.
            self.input = raw;
        }
        submission
    }

    /// Submits a question
    ///
    /// Whitespace-only input is ignored. Otherwise a user turn holding the
    /// trimmed text is appended, the input buffer is cleared, and the
    /// conversation enters [`ConversationState::AwaitingResponse`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::config::ConcurrencyPolicy;
    /// use lexi::conversation::{Conversation, Submission};
    ///
    /// let mut conversation = Conversation::new(ConcurrencyPolicy::Allow);
    /// assert_eq!(conversation.submit("   "), Submission::Ignored);
    ///
    /// let Submission::Dispatched(ticket) = conversation.submit("  Hello  ") else {
    ///     panic!("expected a dispatch ticket");
    /// };
    /// assert_eq!(ticket.question(), "Hello");
    /// assert!(conversation.is_composing());
    /// ```
    pub fn submit(&mut self, raw_text: &str) -> Submission {
        let question = raw_text.trim();
        if question.is_empty() {
            return Submission::Ignored;
        }

        if self.in_flight > 0 && self.policy == ConcurrencyPolicy::Reject {
            tracing::warn!(
                in_flight = self.in_flight,
                "Rejecting submission while a question is pending"
            );
            return Submission::Rejected;
        }

        let id = self.next_id();
        self.messages.push(Message::user(id, question, self.clock.now()));
        self.input.clear();
        self.in_flight += 1;

        tracing::debug!(message_id = id, in_flight = self.in_flight, "Question submitted");

        Submission::Dispatched(PendingQuery {
            message_id: id,
            question: question.to_string(),
        })
    }

    /// Integrates a dispatched answer
    ///
    /// Appends the assistant turn built from `answer` and releases the
    /// ticket. Runs identically for service answers, the reference answer and
    /// the fallback answer.
    pub fn on_dispatch_resolved(
        &mut self,
        pending: PendingQuery,
        answer: AnswerResult,
    ) -> &Message {
        let id = self.next_id();
        let message = Message::assistant(id, answer.text, answer.citations, self.clock.now());
        self.messages.push(message);
        self.in_flight = self.in_flight.saturating_sub(1);

        tracing::debug!(
            message_id = id,
            in_reply_to = pending.message_id,
            origin = %answer.origin,
            in_flight = self.in_flight,
            "Answer appended"
        );

        &self.messages[self.messages.len() - 1]
    }

    fn next_id(&self) -> u64 {
        self.messages.last().map(|m| m.id).unwrap_or(0) + 1
    }

    /// The message log in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Looks up a message by id
    pub fn message(&self, id: u64) -> Option<&Message> {
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|index| &self.messages[index])
    }

    /// The most recent assistant turn
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    /// The most recent assistant turn that carries citations
    pub fn last_cited_answer(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant() && !m.citations.is_empty())
    }

    /// Number of messages in the log
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no message has been appended
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The composing indicator
    pub fn is_composing(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of dispatched questions not yet resolved
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Current state
    pub fn state(&self) -> ConversationState {
        if self.is_composing() {
            ConversationState::AwaitingResponse
        } else {
            ConversationState::Idle
        }
    }

    /// The concurrency policy in effect
    pub fn policy(&self) -> ConcurrencyPolicy {
        self.policy
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.messages.len())
            .field("in_flight", &self.in_flight)
            .field("policy", &self.policy)
            .finish()
    }
}
