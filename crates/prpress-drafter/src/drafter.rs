use async_trait::async_trait;
use prpress_reviewer::ReviewVerdict;
use prpress_service::{ServiceError, ServicePrompt, TextService};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{DraftAttempt, DraftParseError, DraftPrompts, PullRequestChange, DEFAULT_SKIP_SENTINEL};

/// Writes a draft article for a change
#[async_trait]
pub trait Drafter: Send + Sync {
    /// Identifier of the model behind this drafter, reported verbatim to callers
    fn model(&self) -> &str;

    /// Produce draft number `attempt` (1-based). `prior` is the verdict on
    /// the immediately preceding draft, `None` for the first one.
    async fn draft(
        &self,
        change: &PullRequestChange,
        prior: Option<&ReviewVerdict>,
        attempt: usize,
    ) -> Result<DraftAttempt, DraftError>;
}

/// Configuration for [`ServiceDrafter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrafterConfig {
    pub skip_sentinel: String,
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            skip_sentinel: DEFAULT_SKIP_SENTINEL.to_string(),
        }
    }
}

impl DrafterConfig {
    pub fn with_skip_sentinel(mut self, sentinel: String) -> Self {
        self.skip_sentinel = sentinel;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.skip_sentinel.trim().is_empty() {
            return Err("skip_sentinel must not be empty".to_string());
        }
        if self.skip_sentinel.trim() != self.skip_sentinel {
            return Err("skip_sentinel must not have surrounding whitespace".to_string());
        }
        Ok(())
    }
}

/// Drafter backed by a generative-text service
pub struct ServiceDrafter {
    service: Arc<dyn TextService>,
    config: DrafterConfig,
}

impl ServiceDrafter {
    pub fn new(service: Arc<dyn TextService>) -> Self {
        Self::with_config(service, DrafterConfig::default())
    }

    pub fn with_config(service: Arc<dyn TextService>, config: DrafterConfig) -> Self {
        Self { service, config }
    }
}

#[async_trait]
impl Drafter for ServiceDrafter {
    fn model(&self) -> &str {
        self.service.model()
    }

    async fn draft(
        &self,
        change: &PullRequestChange,
        prior: Option<&ReviewVerdict>,
        attempt: usize,
    ) -> Result<DraftAttempt, DraftError> {
        if change.diff_entries.is_empty() {
            return Err(DraftError::EmptyChange(change.label()));
        }

        let user = match prior {
            Some(verdict) => DraftPrompts::build_revision_prompt(change, verdict),
            None => DraftPrompts::build_generation_prompt(change),
        };
        let prompt = ServicePrompt::new(DraftPrompts::system(&self.config.skip_sentinel), user);

        debug!(
            change = %change.label(),
            attempt,
            revision = prior.is_some(),
            prompt_len = prompt.user.len(),
            "Running drafter"
        );

        let reply = self.service.complete(&prompt).await?;

        info!(
            service = self.service.name(),
            duration_secs = reply.duration.as_secs_f64(),
            "Drafter completed"
        );

        Ok(DraftAttempt::parse(
            attempt,
            &reply.text,
            &self.config.skip_sentinel,
        )?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Change {0} has no diff entries")]
    EmptyChange(String),

    #[error("Generation service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Failed to parse draft: {0}")]
    ParseError(#[from] DraftParseError),
}

impl DraftError {
    /// True when the drafter answered but the answer could not be decoded
    pub fn is_malformed(&self) -> bool {
        match self {
            DraftError::ParseError(_) => true,
            DraftError::ServiceError(e) => e.is_malformed(),
            DraftError::EmptyChange(_) => false,
        }
    }
}
