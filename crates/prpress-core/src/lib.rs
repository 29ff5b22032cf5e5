mod batch;
mod config;
mod error;
mod orchestrator;
mod outcome;
mod state;

pub use batch::{BatchReport, BatchRunner, ChangeReport, ChangeStatus};
pub use config::{PipelineConfig, DEFAULT_MAX_ATTEMPTS};
pub use error::{ErrorKind, PipelineError};
pub use orchestrator::Orchestrator;
pub use outcome::{PipelineOutcome, PipelineResult, ReviewStatus};
pub use state::{Draft, PipelineState};

pub use prpress_drafter::{DraftAttempt, Drafter, PullRequestChange};
pub use prpress_reviewer::{Issue, ReviewVerdict, Reviewer, Severity};
