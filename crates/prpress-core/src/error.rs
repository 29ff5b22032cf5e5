use prpress_drafter::DraftError;
use prpress_logging::ServiceRole;
use prpress_reviewer::ReviewError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{repository}#{pr_number} has no diff entries")]
    EmptyChange { repository: String, pr_number: u64 },

    #[error("Drafter failed for {repository}#{pr_number} on attempt {attempt}: {source}")]
    DraftFailed {
        repository: String,
        pr_number: u64,
        attempt: usize,
        source: DraftError,
    },

    #[error("Reviewer failed for {repository}#{pr_number} on attempt {attempt}: {source}")]
    ReviewFailed {
        repository: String,
        pr_number: u64,
        attempt: usize,
        source: ReviewError,
    },

    #[error("Pipeline for {repository}#{pr_number} was interrupted before attempt {attempt}")]
    Interrupted {
        repository: String,
        pr_number: u64,
        attempt: usize,
    },
}

/// Coarse classification so callers can log and alert differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network, timeout, HTTP status or credential failure
    Transport,
    /// A service answered with content that could not be decoded
    Malformed,
    Interrupted,
    InvalidInput,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ConfigError(_) | PipelineError::EmptyChange { .. } => {
                ErrorKind::InvalidInput
            }
            PipelineError::DraftFailed { source, .. } => match source {
                DraftError::EmptyChange(_) => ErrorKind::InvalidInput,
                e if e.is_malformed() => ErrorKind::Malformed,
                _ => ErrorKind::Transport,
            },
            PipelineError::ReviewFailed { source, .. } => match source {
                ReviewError::EmptyArticle => ErrorKind::InvalidInput,
                e if e.is_malformed() => ErrorKind::Malformed,
                _ => ErrorKind::Transport,
            },
            PipelineError::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.kind() == ErrorKind::Malformed
    }

    /// Which service failed, if any
    pub fn failed_service(&self) -> Option<ServiceRole> {
        match self {
            PipelineError::DraftFailed { .. } => Some(ServiceRole::Drafter),
            PipelineError::ReviewFailed { .. } => Some(ServiceRole::Reviewer),
            _ => None,
        }
    }

    /// Attempt the error occurred in (0 when no attempt was started)
    pub fn attempt(&self) -> usize {
        match self {
            PipelineError::DraftFailed { attempt, .. }
            | PipelineError::ReviewFailed { attempt, .. }
            | PipelineError::Interrupted { attempt, .. } => *attempt,
            PipelineError::ConfigError(_) | PipelineError::EmptyChange { .. } => 0,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Malformed => write!(f, "malformed"),
            ErrorKind::Interrupted => write!(f, "interrupted"),
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
        }
    }
}
