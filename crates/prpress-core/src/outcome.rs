use prpress_reviewer::Issue;
use serde::{Deserialize, Serialize};

use crate::PipelineState;

/// Quality classification of a published article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// First draft approved
    Approved,
    /// A later draft approved
    ApprovedWithRetry,
    /// No draft approved; the last one is accepted as is
    ApprovedWithIssues,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::ApprovedWithRetry => "approved_with_retry",
            ReviewStatus::ApprovedWithIssues => "approved_with_issues",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The article produced for one change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub article: String,
    pub summary: String,
    pub review_status: ReviewStatus,
    /// Number of drafts made, in `1..=max_attempts`
    pub review_attempts: usize,
    /// Issues from the verdict on the returned article
    pub review_issues: Vec<Issue>,
    pub reviewer_model: String,
    pub generator_model: String,
}

impl PipelineResult {
    /// Title from the article's first line when it is a Markdown heading,
    /// otherwise `fallback`
    pub fn title(&self, fallback: &str) -> String {
        let first_line = self.article.lines().next().map(str::trim).unwrap_or("");
        if first_line.starts_with('#') {
            let title = first_line.trim_start_matches('#').trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
        fallback.to_string()
    }
}

/// Terminal result of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Published(PipelineResult),
    /// The drafter judged the change unworthy of an article
    Skipped,
}

impl PipelineOutcome {
    /// Map a terminal state into the caller-facing record.
    /// Returns `None` for non-terminal states.
    pub fn assemble(
        state: PipelineState,
        generator_model: &str,
        reviewer_model: &str,
    ) -> Option<Self> {
        let published = |draft: crate::Draft, status, attempts, issues| {
            PipelineOutcome::Published(PipelineResult {
                article: draft.article,
                summary: draft.summary,
                review_status: status,
                review_attempts: attempts,
                review_issues: issues,
                reviewer_model: reviewer_model.to_string(),
                generator_model: generator_model.to_string(),
            })
        };

        match state {
            PipelineState::SkippedOut => Some(PipelineOutcome::Skipped),
            PipelineState::Approved { attempts, draft } => {
                let status = if attempts == 1 {
                    ReviewStatus::Approved
                } else {
                    ReviewStatus::ApprovedWithRetry
                };
                Some(published(draft, status, attempts, Vec::new()))
            }
            PipelineState::Exhausted {
                attempts,
                draft,
                verdict,
            } => Some(published(
                draft,
                ReviewStatus::ApprovedWithIssues,
                attempts,
                verdict.issues,
            )),
            PipelineState::Drafting { .. } | PipelineState::Reviewing { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&PipelineResult> {
        match self {
            PipelineOutcome::Published(result) => Some(result),
            PipelineOutcome::Skipped => None,
        }
    }
}
