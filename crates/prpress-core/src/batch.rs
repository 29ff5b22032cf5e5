use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use prpress_drafter::{NoiseFilter, PullRequestChange};
use prpress_logging::LogEvent;

use crate::{ErrorKind, Orchestrator, PipelineOutcome, PipelineResult};

/// What happened to one change in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeStatus {
    Published(PipelineResult),
    Skipped,
    Filtered { reason: String },
    Failed { kind: ErrorKind, error: String },
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Published(_) => "published",
            ChangeStatus::Skipped => "skipped",
            ChangeStatus::Filtered { .. } => "filtered",
            ChangeStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub pr_number: u64,
    /// Article title for published changes, PR title otherwise
    pub title: String,
    pub url: Option<String>,
    #[serde(flatten)]
    pub status: ChangeStatus,
}

/// Per-change results of a batch, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub repository: String,
    pub changes: Vec<ChangeReport>,
    pub duration_secs: f64,
}

impl BatchReport {
    fn count(&self, status: &str) -> usize {
        self.changes
            .iter()
            .filter(|c| c.status.as_str() == status)
            .count()
    }

    pub fn published(&self) -> usize {
        self.count("published")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    pub fn filtered(&self) -> usize {
        self.count("filtered")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }
}

/// Runs the pipeline over many changes of one repository
pub struct BatchRunner {
    orchestrator: Arc<Orchestrator>,
    concurrency: usize,
    noise_filter: Option<NoiseFilter>,
}

impl BatchRunner {
    /// `concurrency` is clamped to at least 1
    pub fn new(orchestrator: Arc<Orchestrator>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            concurrency: concurrency.max(1),
            noise_filter: Some(NoiseFilter::new()),
        }
    }

    pub fn with_noise_filter(mut self, enabled: bool) -> Self {
        self.noise_filter = enabled.then(NoiseFilter::new);
        self
    }

    /// Process every change. A failing change is recorded and the batch
    /// moves on.
    pub async fn run(&self, repository: &str, changes: Vec<PullRequestChange>) -> BatchReport {
        let started = Instant::now();
        let logger = self.orchestrator.logger().clone();

        logger.log(&LogEvent::BatchStarted {
            repository: repository.to_string(),
            changes: changes.len(),
        });

        let reports: Vec<ChangeReport> = stream::iter(changes)
            .map(|change| self.process(repository, change))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = BatchReport {
            repository: repository.to_string(),
            changes: reports,
            duration_secs: started.elapsed().as_secs_f64(),
        };

        logger.log(&LogEvent::BatchCompleted {
            repository: repository.to_string(),
            published: report.published(),
            skipped: report.skipped(),
            filtered: report.filtered(),
            failed: report.failed(),
            duration_secs: report.duration_secs,
        });

        report
    }

    async fn process(&self, repository: &str, change: PullRequestChange) -> ChangeReport {
        let pr_number = change.pr_number;
        let url = change.url.clone();

        if let Some(reason) = self.noise_filter.as_ref().and_then(|f| f.reason(&change)) {
            info!(pr_number, reason = %reason, "Skipping noise change");
            self.orchestrator
                .logger()
                .log(&LogEvent::ChangeFiltered {
                    pr_number,
                    reason: reason.clone(),
                });
            return ChangeReport {
                pr_number,
                title: change.title,
                url,
                status: ChangeStatus::Filtered { reason },
            };
        }

        let (title, status) = match self.orchestrator.run(repository, &change).await {
            Ok(PipelineOutcome::Published(result)) => {
                (result.title(&change.title), ChangeStatus::Published(result))
            }
            Ok(PipelineOutcome::Skipped) => (change.title, ChangeStatus::Skipped),
            Err(e) => (
                change.title,
                ChangeStatus::Failed {
                    kind: e.kind(),
                    error: e.to_string(),
                },
            ),
        };

        ChangeReport {
            pr_number,
            title,
            url,
            status,
        }
    }
}
