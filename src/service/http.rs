//! HTTP implementation of the answering service
//!
//! Talks JSON to the backend: `POST {endpoint}/query` for questions and
//! `GET {endpoint}/` for the readiness probe.

use super::{AnsweringService, QueryRequest, QueryResponse, ResourceStatus, ServiceHealth};
use crate::config::ServiceConfig;
use crate::error::{LexiError, Result};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Answering service reached over HTTP
///
/// # Examples
///
/// ```
/// use lexi::config::ServiceConfig;
/// use lexi::service::HttpAnsweringService;
///
/// let service = HttpAnsweringService::new(&ServiceConfig::default()).unwrap();
/// assert_eq!(service.query_url(), "http://127.0.0.1:8000/query");
/// ```
#[derive(Debug, Clone)]
pub struct HttpAnsweringService {
    client: Client,
    base_url: String,
}

/// Body of a healthy readiness probe
#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    resource_status: Option<ResourceStatus>,
}

/// Error body returned with a 503
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: Option<String>,
}

impl HttpAnsweringService {
    /// Create a new HTTP answering service client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("lexi/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LexiError::Service(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.endpoint.trim_end_matches('/').to_string();
        tracing::info!("Initialized answering service client: endpoint={}", base_url);

        Ok(Self { client, base_url })
    }

    /// The service base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the question endpoint
    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringService {
    async fn query(&self, question: &str) -> Result<QueryResponse> {
        let url = self.query_url();
        tracing::debug!("Sending question to {} ({} chars)", url, question.len());

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest {
                query: question.to_string(),
            })
            .send()
            .await
            .map_err(LexiError::Http)
            .with_context(|| format!("Request to {} failed", url))?;

        // Error statuses still carry a JSON body worth decoding; only an
        // undecodable body counts as a failure.
        let status = response.status();
        let text = response.text().await.map_err(LexiError::Http)?;
        if !status.is_success() {
            tracing::warn!("Answering service returned {}: {}", status, text);
        }

        let body: QueryResponse = serde_json::from_str(&text)
            .map_err(|e| {
                tracing::error!("Failed to parse answering service response: {}", e);
                LexiError::Serialization(e)
            })
            .with_context(|| {
                format!("Failed to parse answering service response (status {})", status)
            })?;

        Ok(body)
    }

    async fn health(&self) -> Result<ServiceHealth> {
        let url = format!("{}/", self.base_url);
        tracing::debug!("Probing answering service at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(LexiError::Http)
            .with_context(|| format!("Answering service unreachable at {}", url))?;

        match response.status() {
            status if status.is_success() => {
                let body: HealthResponse = response
                    .json()
                    .await
                    .map_err(LexiError::Http)
                    .context("Failed to parse health response")?;
                Ok(ServiceHealth {
                    ready: body.status == "ok",
                    detail: None,
                    resources: body.resource_status,
                })
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                let detail = response
                    .json::<ErrorDetail>()
                    .await
                    .ok()
                    .and_then(|body| body.detail);
                Ok(ServiceHealth {
                    ready: false,
                    detail,
                    resources: None,
                })
            }
            status => Err(LexiError::Service(format!(
                "Unexpected health status {} from {}",
                status, url
            ))
            .into()),
        }
    }
}
