use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::{ServicePrompt, ServiceReply};

/// Errors that can occur while calling a generative-text service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Credentials rejected (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed service response: {0}")]
    MalformedEnvelope(String),

    #[error("Service configuration error: {0}")]
    ConfigError(String),
}

impl ServiceError {
    /// True when the service answered but not in the shape we expect
    pub fn is_malformed(&self) -> bool {
        matches!(self, ServiceError::MalformedEnvelope(_))
    }
}

/// Supported service vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Anthropic,
    Gemini,
}

impl ServiceKind {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            ServiceKind::Anthropic => "https://api.anthropic.com/v1/messages",
            ServiceKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ServiceKind::Anthropic => "claude-sonnet-4-5",
            ServiceKind::Gemini => "gemini-2.5-flash",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Anthropic => write!(f, "anthropic"),
            ServiceKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ServiceKind::Anthropic),
            "gemini" | "google" => Ok(ServiceKind::Gemini),
            _ => Err(format!("Unknown service kind: {}", s)),
        }
    }
}

/// Configuration for one service adapter
#[derive(Clone)]
pub struct ServiceConfig {
    /// Endpoint (Anthropic: full messages URL, Gemini: API base URL)
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-call timeout
    pub timeout: Duration,
    pub max_tokens: u32,
    /// Cap on in-flight requests shared by every clone of the adapter
    pub max_concurrent_requests: usize,
    /// Ask the vendor to constrain the reply to JSON, where it supports that
    pub json_response: bool,
}

impl ServiceConfig {
    pub fn new(kind: ServiceKind, api_key: String) -> Self {
        Self {
            api_url: kind.default_api_url().to_string(),
            api_key,
            model: kind.default_model().to_string(),
            timeout: Duration::from_secs(120),
            max_tokens: 4096,
            max_concurrent_requests: 4,
            json_response: false,
        }
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn with_json_response(mut self, json_response: bool) -> Self {
        self.json_response = json_response;
        self
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("json_response", &self.json_response)
            .finish()
    }
}

/// A remote service that turns a prompt into text
#[async_trait]
pub trait TextService: Send + Sync {
    /// Human-readable vendor name (e.g., "Anthropic Messages")
    fn name(&self) -> &str;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Send one prompt and wait for the complete reply
    async fn complete(&self, prompt: &ServicePrompt) -> Result<ServiceReply, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind_from_str() {
        assert_eq!("claude".parse::<ServiceKind>(), Ok(ServiceKind::Anthropic));
        assert_eq!("Gemini".parse::<ServiceKind>(), Ok(ServiceKind::Gemini));
        assert!("openai".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = ServiceConfig::new(ServiceKind::Anthropic, "sk-secret".into());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_only_envelope_errors_are_malformed() {
        assert!(ServiceError::MalformedEnvelope("no text".into()).is_malformed());
        assert!(!ServiceError::Timeout(Duration::from_secs(1)).is_malformed());
        assert!(!ServiceError::Unauthorized {
            status: 401,
            body: String::new()
        }
        .is_malformed());
    }
}
