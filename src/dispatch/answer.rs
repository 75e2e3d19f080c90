//! Answer results produced by the dispatcher

use crate::conversation::{Citation, CitationStore};
use crate::service::QueryResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when the service answers without any text
pub const NO_RELIABLE_ANSWER: &str = "Sorry, I couldn't find a reliable answer.";

/// Answer used when the answering service cannot be reached or understood
pub const BACKEND_UNREACHABLE: &str = "I couldn't reach the Lexi answering service, so I can't \
answer right now. Please check that the backend is running and reachable from this machine, \
then try again.";

/// Which path produced an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    /// Canned answer for the built-in reference question
    Reference,
    /// Answer returned by the answering service
    #[default]
    Service,
    /// Canned answer after a transport or parse failure
    Fallback,
}

impl fmt::Display for AnswerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Service => write!(f, "service"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// The outcome of one dispatch
///
/// Failures are expressed as data: a fallback answer is still an
/// `AnswerResult`, so the conversation has a single path to integrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Answer text, possibly with emphasis markup
    pub text: String,
    /// Supporting citations in marker order
    #[serde(default)]
    pub citations: CitationStore,
    /// Which path produced the answer
    #[serde(default)]
    pub origin: AnswerOrigin,
}

impl AnswerResult {
    /// Builds a service answer
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::dispatch::{AnswerOrigin, AnswerResult};
    ///
    /// let answer = AnswerResult::from_service("Hi there", vec![]);
    /// assert_eq!(answer.origin, AnswerOrigin::Service);
    /// assert!(answer.citations.is_empty());
    /// ```
    pub fn from_service(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            citations: CitationStore::from(citations),
            origin: AnswerOrigin::Service,
        }
    }

    /// Builds an answer from a decoded service response
    ///
    /// A missing or empty `answer` becomes [`NO_RELIABLE_ANSWER`]; missing
    /// `citations` become an empty list.
    pub fn from_response(response: QueryResponse) -> Self {
        let text = response
            .answer
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| NO_RELIABLE_ANSWER.to_string());
        Self::from_service(text, response.citations.unwrap_or_default())
    }

    /// The answer given when the service is unreachable
    pub fn fallback() -> Self {
        Self {
            text: BACKEND_UNREACHABLE.to_string(),
            citations: CitationStore::new(),
            origin: AnswerOrigin::Fallback,
        }
    }
}
