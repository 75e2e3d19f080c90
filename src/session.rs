//! Chat session controller
//!
//! The session owns the conversation, the citation overlay and the
//! dispatcher. UI code never mutates state directly: it calls the session's
//! methods and renders the [`SessionEvent`]s the session publishes.
//!
//! State lives behind a mutex that is released before every `.await`, so
//! several `ask` futures may be polled concurrently on one runtime; their
//! replies are appended in the order the dispatches resolve. Dropping an
//! `ask` future after its question was accepted appends the fallback answer.

use crate::config::{ConcurrencyPolicy, Config};
use crate::conversation::{
    Citation, CitationModal, Conversation, ConversationState, Message, PendingQuery, Submission,
};
use crate::dispatch::{AnswerOrigin, AnswerResult, QueryDispatcher};
use crate::error::{LexiError, Result};
use crate::service::ServiceHealth;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// State change published by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A turn was appended to the log
    MessageAppended(Message),
    /// The composing indicator changed
    ComposingChanged(bool),
    /// A submission was refused because a question is pending
    SubmissionRejected,
    /// The citation overlay now shows this citation
    CitationOpened(Citation),
    /// The citation overlay was closed
    CitationClosed,
}

/// The assistant turn produced by one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// The appended assistant message
    pub message: Message,
    /// Which path produced the answer
    pub origin: AnswerOrigin,
}

struct SessionState {
    conversation: Conversation,
    modal: CitationModal,
}

/// Resolves a dispatched question whose `ask` future was dropped
///
/// Every accepted question gets an assistant turn. If the future asking it
/// is cancelled mid-dispatch, the fallback answer is appended on drop.
struct PendingGuard<'a> {
    session: &'a ChatSession,
    pending: Option<PendingQuery>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::warn!(
                message_id = pending.message_id(),
                "Question abandoned before its answer arrived, appending fallback"
            );
            self.session.resolve(pending, AnswerResult::fallback());
        }
    }
}

/// Controller for one conversation
pub struct ChatSession {
    state: Mutex<SessionState>,
    dispatcher: QueryDispatcher,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    /// Creates a session around an existing conversation
    pub fn new(dispatcher: QueryDispatcher, conversation: Conversation) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(SessionState {
                conversation,
                modal: CitationModal::new(),
            }),
            dispatcher,
            events,
        }
    }

    /// Creates a session that talks HTTP to the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            QueryDispatcher::from_config(config)?,
            Conversation::new(config.chat.concurrency),
        ))
    }

    /// Subscribes to state-change notifications
    ///
    /// Only events published after the call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine; the state is the source of truth.
        let _ = self.events.send(event);
    }

    /// Submits a question and waits for its answer
    ///
    /// Returns the appended assistant turn, or `None` when the input was
    /// blank or the submission was rejected.
    pub async fn ask(&self, raw_text: &str) -> Option<Message> {
        self.ask_detailed(raw_text).await.map(|reply| reply.message)
    }

    /// Like [`ChatSession::ask`], also reporting where the answer came from
    pub async fn ask_detailed(&self, raw_text: &str) -> Option<Reply> {
        let (pending, user_message, started_composing) = {
            let mut state = self.lock();
            let was_composing = state.conversation.is_composing();
            let submission = state.conversation.submit(raw_text);
            match submission {
                Submission::Ignored => return None,
                Submission::Rejected => {
                    drop(state);
                    self.publish(SessionEvent::SubmissionRejected);
                    return None;
                }
                Submission::Dispatched(pending) => {
                    let user_message = state.conversation.messages().last().cloned();
                    (pending, user_message, !was_composing)
                }
            }
        };

        if let Some(message) = user_message {
            self.publish(SessionEvent::MessageAppended(message));
        }
        if started_composing {
            self.publish(SessionEvent::ComposingChanged(true));
        }

        let question = pending.question().to_string();
        let mut guard = PendingGuard {
            session: self,
            pending: Some(pending),
        };

        let answer = self.dispatcher.dispatch(&question).await;
        let origin = answer.origin;

        let message = self.resolve(guard.pending.take()?, answer);
        Some(Reply { message, origin })
    }

    /// Appends the answer to `pending` and publishes the change
    fn resolve(&self, pending: PendingQuery, answer: AnswerResult) -> Message {
        let (reply, stopped_composing) = {
            let mut state = self.lock();
            let reply = state
                .conversation
                .on_dispatch_resolved(pending, answer)
                .clone();
            (reply, !state.conversation.is_composing())
        };

        self.publish(SessionEvent::MessageAppended(reply.clone()));
        if stopped_composing {
            self.publish(SessionEvent::ComposingChanged(false));
        }
        reply
    }

    /// Opens the citation behind marker `[marker]` of message `message_id`
    ///
    /// # Errors
    ///
    /// Returns [`LexiError::MessageNotFound`] for an unknown id and
    /// [`LexiError::CitationNotFound`] when the marker is out of range. The
    /// overlay is left unchanged on error.
    pub fn open_citation(&self, message_id: u64, marker: usize) -> Result<Citation> {
        let citation = {
            let mut state = self.lock();
            let message = state
                .conversation
                .message(message_id)
                .ok_or(LexiError::MessageNotFound(message_id))?;
            let citation = message
                .citations
                .by_marker(marker)
                .cloned()
                .ok_or(LexiError::CitationNotFound { message_id, marker })?;
            state.modal.open(citation.clone());
            citation
        };

        tracing::debug!(message_id, marker, "Citation opened");
        self.publish(SessionEvent::CitationOpened(citation.clone()));
        Ok(citation)
    }

    /// Opens marker `[marker]` of the most recent answer that has citations
    ///
    /// # Errors
    ///
    /// Returns [`LexiError::NoCitations`] when no answer carries citations,
    /// otherwise the errors of [`ChatSession::open_citation`]
    pub fn open_latest_citation(&self, marker: usize) -> Result<Citation> {
        let message_id = self
            .lock()
            .conversation
            .last_cited_answer()
            .map(|m| m.id)
            .ok_or(LexiError::NoCitations)?;
        self.open_citation(message_id, marker)
    }

    /// Closes the citation overlay
    pub fn close_citation(&self) {
        let was_open = {
            let mut state = self.lock();
            let was_open = state.modal.is_open();
            state.modal.close();
            was_open
        };
        if was_open {
            self.publish(SessionEvent::CitationClosed);
        }
    }

    /// The citation currently shown, if any
    pub fn selected_citation(&self) -> Option<Citation> {
        self.lock().modal.selected().cloned()
    }

    /// Snapshot of the message log
    pub fn messages(&self) -> Vec<Message> {
        self.lock().conversation.messages().to_vec()
    }

    /// Number of messages in the log
    pub fn len(&self) -> usize {
        self.lock().conversation.len()
    }

    /// Returns true if nothing has been asked yet
    pub fn is_empty(&self) -> bool {
        self.lock().conversation.is_empty()
    }

    /// The composing indicator
    pub fn is_composing(&self) -> bool {
        self.lock().conversation.is_composing()
    }

    /// Current conversation state
    pub fn state(&self) -> ConversationState {
        self.lock().conversation.state()
    }

    /// Concurrency policy in effect
    pub fn policy(&self) -> ConcurrencyPolicy {
        self.lock().conversation.policy()
    }

    /// Probes the answering service
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot be reached
    pub async fn health(&self) -> Result<ServiceHealth> {
        self.dispatcher.service().health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::NoDelay;
    use crate::service::{AnsweringService, QueryResponse};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio_test::{assert_pending, assert_ready};

    /// Answers only after the test releases a permit
    struct GatedService {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl AnsweringService for GatedService {
        async fn query(&self, question: &str) -> Result<QueryResponse> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| LexiError::Service(e.to_string()))?;
            permit.forget();
            Ok(QueryResponse {
                answer: Some(format!("answer to {}", question)),
                citations: Some(vec![
                    Citation::new("first excerpt", "Doc A"),
                    Citation::new("second excerpt", "Doc B"),
                ]),
            })
        }
    }

    fn gated_session(policy: ConcurrencyPolicy) -> (ChatSession, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let dispatcher = QueryDispatcher::new(
            Arc::new(GatedService { gate: gate.clone() }),
            Arc::new(NoDelay),
            Duration::from_millis(1500),
        );
        (
            ChatSession::new(dispatcher, Conversation::new(policy)),
            gate,
        )
    }

    #[test]
    fn test_composing_only_while_dispatch_pending() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Allow);
        assert!(!session.is_composing());

        let mut ask = tokio_test::task::spawn(session.ask("Hello"));
        assert_pending!(ask.poll());
        assert!(session.is_composing());
        assert_eq!(session.len(), 1);
        assert_eq!(session.state(), ConversationState::AwaitingResponse);

        gate.add_permits(1);
        assert!(ask.is_woken());
        let reply = assert_ready!(ask.poll()).unwrap();

        assert_eq!(reply.text, "answer to Hello");
        assert!(!session.is_composing());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_reject_policy_publishes_rejection() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Reject);
        let mut events = session.subscribe();

        let mut first = tokio_test::task::spawn(session.ask("first"));
        assert_pending!(first.poll());

        let mut second = tokio_test::task::spawn(session.ask("second"));
        assert!(assert_ready!(second.poll()).is_none());
        assert_eq!(session.len(), 1);

        gate.add_permits(1);
        assert!(assert_ready!(first.poll()).is_some());

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert!(received.contains(&SessionEvent::SubmissionRejected));
    }

    #[test]
    fn test_event_sequence_for_one_question() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Allow);
        let mut events = session.subscribe();

        gate.add_permits(1);
        let mut ask = tokio_test::task::spawn(session.ask("Hello"));
        assert_ready!(ask.poll());

        let kinds: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| match event {
                SessionEvent::MessageAppended(m) => format!("append:{}", m.role),
                SessionEvent::ComposingChanged(on) => format!("composing:{}", on),
                other => format!("{:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "append:user",
                "composing:true",
                "append:assistant",
                "composing:false"
            ]
        );
    }

    #[test]
    fn test_dropped_ask_still_answers_its_question() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Reject);
        let mut events = session.subscribe();

        let mut ask = tokio_test::task::spawn(session.ask("Hello"));
        assert_pending!(ask.poll());
        assert!(session.is_composing());
        drop(ask);

        assert!(!session.is_composing());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_assistant());
        assert_eq!(messages[1].text, AnswerResult::fallback().text);

        let last = std::iter::from_fn(|| events.try_recv().ok()).last();
        assert_eq!(last, Some(SessionEvent::ComposingChanged(false)));

        gate.add_permits(1);
        let mut next = tokio_test::task::spawn(session.ask("second"));
        let reply = assert_ready!(next.poll()).unwrap();
        assert_eq!(reply.text, "answer to second");
    }

    #[test]
    fn test_blank_question_publishes_nothing() {
        let (session, _gate) = gated_session(ConcurrencyPolicy::Allow);
        let mut events = session.subscribe();
        let mut ask = tokio_test::task::spawn(session.ask("  \n "));
        assert!(assert_ready!(ask.poll()).is_none());
        assert!(events.try_recv().is_err());
        assert!(session.is_empty());
    }

    #[test]
    fn test_open_and_close_citation() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Allow);
        gate.add_permits(1);
        let reply = assert_ready!(tokio_test::task::spawn(session.ask("q")).poll()).unwrap();

        let citation = session.open_citation(reply.id, 2).unwrap();
        assert_eq!(citation.source.as_deref(), Some("Doc B"));
        assert_eq!(session.selected_citation(), reply.citations.get(1).cloned());

        session.close_citation();
        assert!(session.selected_citation().is_none());
    }

    #[test]
    fn test_open_citation_errors_leave_modal_unchanged() {
        let (session, gate) = gated_session(ConcurrencyPolicy::Allow);
        gate.add_permits(1);
        let reply = assert_ready!(tokio_test::task::spawn(session.ask("q")).poll()).unwrap();
        session.open_citation(reply.id, 1).unwrap();

        let err = session.open_citation(reply.id, 3).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LexiError>(),
            Some(LexiError::CitationNotFound { marker: 3, .. })
        ));
        let err = session.open_citation(reply.id, 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LexiError>(),
            Some(LexiError::CitationNotFound { marker: 0, .. })
        ));
        let err = session.open_citation(99, 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LexiError>(),
            Some(LexiError::MessageNotFound(99))
        ));

        assert_eq!(
            session.selected_citation().and_then(|c| c.source),
            Some("Doc A".to_string())
        );
    }

    #[test]
    fn test_open_latest_citation_without_answers() {
        let (session, _gate) = gated_session(ConcurrencyPolicy::Allow);
        let err = session.open_latest_citation(1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LexiError>(),
            Some(LexiError::NoCitations)
        ));
    }

    #[test]
    fn test_close_when_closed_publishes_nothing() {
        let (session, _gate) = gated_session(ConcurrencyPolicy::Allow);
        let mut events = session.subscribe();
        session.close_citation();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_yields_fallback_turn() {
        struct Down;

        #[async_trait]
        impl AnsweringService for Down {
            async fn query(&self, _question: &str) -> Result<QueryResponse> {
                Err(LexiError::Service("connection refused".to_string()).into())
            }
        }

        let dispatcher = QueryDispatcher::new(Arc::new(Down), Arc::new(NoDelay), Duration::ZERO);
        let session = ChatSession::new(dispatcher, Conversation::new(ConcurrencyPolicy::Allow));
        let Reply { message: reply, origin } = session.ask_detailed("Hello").await.unwrap();

        assert_eq!(origin, AnswerOrigin::Fallback);
        assert!(reply.is_assistant());
        assert!(reply.citations.is_empty());
        assert_eq!(reply.text, crate::dispatch::AnswerResult::fallback().text);
        assert!(!session.is_composing());
    }
}
