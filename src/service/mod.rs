//! Answering service abstraction for Lexi
//!
//! The answering service is the remote backend that turns a legal question
//! into an answer with citations. This module defines the trait the
//! dispatcher talks to and the wire types of its JSON contract.

pub mod http;

pub use http::HttpAnsweringService;

use crate::conversation::Citation;
use crate::error::{LexiError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question as submitted
    pub query: String,
}

/// Response body of `POST /query`
///
/// Both fields are optional; the dispatcher substitutes defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text
    #[serde(default)]
    pub answer: Option<String>,
    /// Supporting citations
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
}

/// Resource counters reported by the backend readiness probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Embedding model loaded
    #[serde(default)]
    pub model_loaded: bool,
    /// Vector index loaded
    #[serde(default)]
    pub index_loaded: bool,
    /// Chunk metadata loaded
    #[serde(default)]
    pub metadata_loaded: bool,
    /// Number of vectors in the index
    #[serde(default)]
    pub index_size: u64,
    /// Number of metadata entries
    #[serde(default)]
    pub metadata_count: u64,
}

/// Readiness of the answering service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// True when the backend can answer questions
    pub ready: bool,
    /// Explanation supplied by the backend when it is not ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Resource counters, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceStatus>,
}

/// A backend able to answer legal questions
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Sends `question` and decodes the answer
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot be reached or returns a body that
    /// is not a valid response. A well-formed body is decoded whatever the
    /// HTTP status.
    async fn query(&self, question: &str) -> Result<QueryResponse>;

    /// Probes the backend's readiness
    ///
    /// # Default Implementation
    ///
    /// Reports that health checks are unsupported.
    async fn health(&self) -> Result<ServiceHealth> {
        Err(LexiError::Service(
            "Health checks are not supported by this service".to_string(),
        )
        .into())
    }
}

#[async_trait]
impl<T: AnsweringService + ?Sized> AnsweringService for Arc<T> {
    async fn query(&self, question: &str) -> Result<QueryResponse> {
        (**self).query(question).await
    }

    async fn health(&self) -> Result<ServiceHealth> {
        (**self).health().await
    }
}
