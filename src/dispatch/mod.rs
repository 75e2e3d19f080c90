//! Query dispatch for Lexi
//!
//! The dispatcher turns a question into an [`AnswerResult`]:
//!
//! 1. The built-in reference question is answered locally.
//! 2. Anything else is sent to the answering service.
//! 3. Transport and decoding failures become the fallback answer.
//!
//! Every path waits the same configured delay before returning, so the
//! composing indicator is visible for a consistent minimum time whichever
//! path produced the answer. The delay goes through the [`Delay`] trait so
//! tests can skip it.

pub mod answer;
pub mod reference;

pub use answer::{AnswerOrigin, AnswerResult, BACKEND_UNREACHABLE, NO_RELIABLE_ANSWER};
pub use reference::{
    is_reference_question, normalize_question, reference_answer, REFERENCE_CITATION_SOURCE,
    REFERENCE_QUESTION,
};

use crate::config::Config;
use crate::error::Result;
use crate::service::{AnsweringService, HttpAnsweringService};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Suspension point used for the artificial response delay
#[async_trait]
pub trait Delay: Send + Sync {
    /// Waits for `duration`
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

/// Sends questions to the answering service and never fails
///
/// # Examples
///
/// ```no_run
/// use lexi::config::Config;
/// use lexi::dispatch::QueryDispatcher;
///
/// # async fn example() -> lexi::error::Result<()> {
/// let dispatcher = QueryDispatcher::from_config(&Config::default())?;
/// let answer = dispatcher.dispatch("Is a verbal agreement enforceable?").await;
/// println!("{}", answer.text);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryDispatcher {
    service: Arc<dyn AnsweringService>,
    delay: Arc<dyn Delay>,
    response_delay: Duration,
}

impl QueryDispatcher {
    /// Creates a dispatcher from its collaborators
    pub fn new(
        service: Arc<dyn AnsweringService>,
        delay: Arc<dyn Delay>,
        response_delay: Duration,
    ) -> Self {
        Self {
            service,
            delay,
            response_delay,
        }
    }

    /// Creates a dispatcher talking HTTP to the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = HttpAnsweringService::new(&config.service)?;
        Ok(Self::new(
            Arc::new(service),
            Arc::new(TokioDelay),
            config.dispatch.response_delay(),
        ))
    }

    /// The answering service this dispatcher talks to
    pub fn service(&self) -> &Arc<dyn AnsweringService> {
        &self.service
    }

    /// The fixed delay applied to every answer
    pub fn response_delay(&self) -> Duration {
        self.response_delay
    }

    /// Answers `question`
    ///
    /// The service receives `question` unchanged; normalization is only used
    /// to recognize the reference question.
    pub async fn dispatch(&self, question: &str) -> AnswerResult {
        let answer = if is_reference_question(question) {
            tracing::info!("Answering reference question locally");
            reference_answer()
        } else {
            match self.service.query(question).await {
                Ok(response) => {
                    let answer = AnswerResult::from_response(response);
                    tracing::info!(
                        citations = answer.citations.len(),
                        "Received answer from service"
                    );
                    answer
                }
                Err(e) => {
                    tracing::warn!("Answering service unavailable, using fallback: {:#}", e);
                    AnswerResult::fallback()
                }
            }
        };

        self.delay.wait(self.response_delay).await;
        answer
    }
}
