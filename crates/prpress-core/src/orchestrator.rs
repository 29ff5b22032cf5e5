use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Level};

use prpress_drafter::{DraftError, Drafter, PullRequestChange};
use prpress_logging::{LogEvent, Logger};
use prpress_reviewer::{ReviewVerdict, Reviewer};

use crate::{PipelineConfig, PipelineError, PipelineOutcome, PipelineState};

/// Drives one change through the draft→review loop
///
/// Holds no per-change state; `run` may be called concurrently.
pub struct Orchestrator {
    drafter: Arc<dyn Drafter>,
    reviewer: Arc<dyn Reviewer>,
    config: PipelineConfig,
    logger: Arc<Logger>,
    interrupted: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        drafter: Arc<dyn Drafter>,
        reviewer: Arc<dyn Reviewer>,
        config: PipelineConfig,
        logger: Arc<Logger>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        Ok(Self {
            drafter,
            reviewer,
            config,
            logger,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generator_model(&self) -> &str {
        self.drafter.model()
    }

    pub fn reviewer_model(&self) -> &str {
        self.reviewer.model()
    }

    /// Run the pipeline for one change until a terminal state or a fatal error
    pub async fn run(
        &self,
        repository: &str,
        change: &PullRequestChange,
    ) -> Result<PipelineOutcome, PipelineError> {
        let pr_number = change.pr_number;

        if change.diff_entries.is_empty() {
            let err = PipelineError::EmptyChange {
                repository: repository.to_string(),
                pr_number,
            };
            self.log_failure(pr_number, &err);
            return Err(err);
        }

        self.logger.log(&LogEvent::PipelineStarted {
            repository: repository.to_string(),
            pr_number,
            title: change.title.clone(),
        });

        let mut state = PipelineState::initial();

        while !state.is_terminal() {
            debug!(pr_number, state = state.name(), "Pipeline step");
            state = match self.step(repository, change, state).await {
                Ok(next) => next,
                Err(e) => {
                    self.log_failure(pr_number, &e);
                    return Err(e);
                }
            };
        }

        let outcome = PipelineOutcome::assemble(
            state,
            self.generator_model(),
            self.reviewer_model(),
        )
        .ok_or_else(|| {
            PipelineError::ConfigError("pipeline stopped in a non-terminal state".to_string())
        })?;

        match &outcome {
            PipelineOutcome::Skipped => {
                self.logger.log(&LogEvent::PipelineSkipped { pr_number });
            }
            PipelineOutcome::Published(result) => {
                self.logger.log(&LogEvent::PipelineCompleted {
                    pr_number,
                    status: result.review_status.to_string(),
                    attempts: result.review_attempts,
                });
            }
        }

        Ok(outcome)
    }

    /// Perform the service call for a non-terminal state and return the next state
    async fn step(
        &self,
        repository: &str,
        change: &PullRequestChange,
        state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        let pr_number = change.pr_number;

        match state {
            PipelineState::Drafting { attempt, feedback } => {
                self.check_interrupted(repository, pr_number, attempt)?;

                self.logger.log(&LogEvent::DraftStarted { pr_number, attempt });
                let started = Instant::now();

                let draft_failed = |source: DraftError| PipelineError::DraftFailed {
                    repository: repository.to_string(),
                    pr_number,
                    attempt,
                    source,
                };

                let draft = self
                    .drafter
                    .draft(change, feedback.as_ref(), attempt)
                    .await
                    .map_err(draft_failed)?;

                self.logger.log(&LogEvent::DraftCompleted {
                    pr_number,
                    attempt,
                    skipped: draft.is_skip,
                    duration_secs: started.elapsed().as_secs_f64(),
                });

                PipelineState::after_draft(attempt, draft)
                    .map_err(|e| draft_failed(DraftError::ParseError(e)))
            }
            PipelineState::Reviewing { attempt, draft } => {
                self.check_interrupted(repository, pr_number, attempt)?;

                self.logger.log(&LogEvent::ReviewStarted { pr_number, attempt });
                let started = Instant::now();

                let verdict = self
                    .reviewer
                    .review(&draft.article, attempt)
                    .await
                    .map_err(|source| PipelineError::ReviewFailed {
                        repository: repository.to_string(),
                        pr_number,
                        attempt,
                        source,
                    })?;

                self.logger.log(&LogEvent::ReviewCompleted {
                    pr_number,
                    attempt,
                    verdict: verdict.short_description(),
                    duration_secs: started.elapsed().as_secs_f64(),
                });

                self.report_verdict(pr_number, attempt, &verdict);

                Ok(PipelineState::after_review(
                    attempt,
                    draft,
                    verdict,
                    self.config.max_attempts,
                ))
            }
            terminal => Ok(terminal),
        }
    }

    fn check_interrupted(
        &self,
        repository: &str,
        pr_number: u64,
        attempt: usize,
    ) -> Result<(), PipelineError> {
        if self.interrupted.load(Ordering::SeqCst) {
            info!(pr_number, attempt, "Pipeline interrupted by user");
            return Err(PipelineError::Interrupted {
                repository: repository.to_string(),
                pr_number,
                attempt,
            });
        }
        Ok(())
    }

    fn report_verdict(&self, pr_number: u64, attempt: usize, verdict: &ReviewVerdict) {
        let retries = attempt - 1;

        if verdict.approved {
            info!(pr_number, "Article approved after {} retries", retries);
            return;
        }

        let issues = serde_json::to_string(&verdict.issues).unwrap_or_default();
        let critical = verdict.critical_issues();

        if rejection_level(attempt, self.config.max_attempts) == Level::INFO {
            info!(
                pr_number,
                "Article review failed (attempt {}), regenerating with feedback", attempt
            );
            info!(pr_number, critical, "Issues: {}", issues);
        } else {
            warn!(pr_number, "Article review failed after {} retries", retries);
            warn!(pr_number, critical, "Issues: {}", issues);
        }
    }

    fn log_failure(&self, pr_number: u64, err: &PipelineError) {
        warn!(pr_number, kind = %err.kind(), error = %err, "Pipeline failed");
        self.logger.log(&LogEvent::PipelineFailed {
            pr_number,
            attempt: err.attempt(),
            role: err.failed_service(),
            error: err.to_string(),
        });
    }
}

/// Rejections that still leave a retry are routine; the last one is a warning
fn rejection_level(attempt: usize, max_attempts: usize) -> Level {
    if attempt < max_attempts {
        Level::INFO
    } else {
        Level::WARN
    }
}
