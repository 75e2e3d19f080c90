//! Configuration management for Lexi
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{LexiError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/lexi.yaml";

/// Upper bound accepted for the artificial response delay
const MAX_RESPONSE_DELAY_MS: u64 = 60_000;

/// Main configuration structure for Lexi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Answering service connection settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Query dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Answering service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the answering service; `/query` is appended for questions
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds; a timeout is handled like any transport failure
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Query dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Fixed delay applied before every answer is handed back (milliseconds)
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,
}

fn default_response_delay_ms() -> u64 {
    1500
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            response_delay_ms: default_response_delay_ms(),
        }
    }
}

impl DispatchConfig {
    /// The configured response delay as a [`Duration`]
    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }
}

/// What happens when a question is submitted while another is still pending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Accept the submission; replies are appended in resolution order
    #[default]
    Allow,
    /// Refuse the submission until the pending question resolves
    Reject,
}

impl ConcurrencyPolicy {
    /// Parse a policy from a string ("allow" or "reject")
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::config::ConcurrencyPolicy;
    ///
    /// assert_eq!(ConcurrencyPolicy::parse_str("Reject").unwrap(), ConcurrencyPolicy::Reject);
    /// assert!(ConcurrencyPolicy::parse_str("queue").is_err());
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!("Unknown concurrency policy: {}", other)),
        }
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Policy for submissions made while a question is pending
    #[serde(default)]
    pub concurrency: ConcurrencyPolicy,

    /// Show message timestamps in the transcript
    #[serde(default = "default_show_timestamps")]
    pub show_timestamps: bool,
}

fn default_show_timestamps() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyPolicy::default(),
            show_timestamps: default_show_timestamps(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(LexiError::Io)
            .with_context(|| format!("Failed to read config file {}", path))?;
        serde_yaml::from_str(&contents)
            .map_err(LexiError::Yaml)
            .with_context(|| format!("Failed to parse config {}", path))
    }

    fn apply_env_vars(&mut self) {
        if let Ok(endpoint) = std::env::var("LEXI_ENDPOINT") {
            self.service.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("LEXI_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid LEXI_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(delay) = std::env::var("LEXI_RESPONSE_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.dispatch.response_delay_ms = value;
            } else {
                tracing::warn!("Invalid LEXI_RESPONSE_DELAY_MS: {}", delay);
            }
        }

        if let Ok(policy) = std::env::var("LEXI_CONCURRENCY") {
            match ConcurrencyPolicy::parse_str(&policy) {
                Ok(value) => self.chat.concurrency = value,
                Err(e) => tracing::warn!("Invalid LEXI_CONCURRENCY: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(endpoint) = &cli.endpoint {
            tracing::debug!("Using endpoint override from CLI: {}", endpoint);
            self.service.endpoint = endpoint.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not an http(s) URL, the timeout is
    /// zero, or the response delay is unreasonably large
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.service.endpoint).map_err(|e| {
            LexiError::Config(format!(
                "Invalid service.endpoint '{}': {}",
                self.service.endpoint, e
            ))
        })?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(LexiError::Config(format!(
                "service.endpoint must use http or https, got {}",
                endpoint.scheme()
            ))
            .into());
        }

        if self.service.request_timeout_seconds == 0 {
            return Err(LexiError::Config(
                "service.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.dispatch.response_delay_ms > MAX_RESPONSE_DELAY_MS {
            return Err(LexiError::Config(format!(
                "dispatch.response_delay_ms must be less than or equal to {}",
                MAX_RESPONSE_DELAY_MS
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            dispatch: DispatchConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}
