use prpress_drafter::{DraftAttempt, DraftParseError};
use prpress_reviewer::ReviewVerdict;

/// Article content of a non-skip draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub article: String,
    pub summary: String,
}

/// States of the draft→review loop
///
/// `attempt` is 1-based and only ever increases. Terminal states are
/// `Approved`, `Exhausted` and `SkippedOut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Drafting {
        attempt: usize,
        /// Verdict on the previous draft, `None` for attempt 1
        feedback: Option<ReviewVerdict>,
    },
    Reviewing {
        attempt: usize,
        draft: Draft,
    },
    Approved {
        attempts: usize,
        draft: Draft,
    },
    Exhausted {
        attempts: usize,
        draft: Draft,
        verdict: ReviewVerdict,
    },
    SkippedOut,
}

impl PipelineState {
    pub fn initial() -> Self {
        PipelineState::Drafting {
            attempt: 1,
            feedback: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Approved { .. }
                | PipelineState::Exhausted { .. }
                | PipelineState::SkippedOut
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Drafting { .. } => "drafting",
            PipelineState::Reviewing { .. } => "reviewing",
            PipelineState::Approved { .. } => "approved",
            PipelineState::Exhausted { .. } => "exhausted",
            PipelineState::SkippedOut => "skipped_out",
        }
    }

    /// Transition out of `Drafting(attempt)` once the drafter has answered
    pub fn after_draft(attempt: usize, draft: DraftAttempt) -> Result<Self, DraftParseError> {
        if draft.is_skip {
            return Ok(PipelineState::SkippedOut);
        }

        match draft.article_markdown {
            Some(article) if !article.trim().is_empty() => Ok(PipelineState::Reviewing {
                attempt,
                draft: Draft {
                    article,
                    summary: draft.summary.unwrap_or_default(),
                },
            }),
            _ => Err(DraftParseError::EmptyArticle),
        }
    }

    /// Transition out of `Reviewing(attempt)` once the reviewer has answered
    pub fn after_review(
        attempt: usize,
        draft: Draft,
        verdict: ReviewVerdict,
        max_attempts: usize,
    ) -> Self {
        if verdict.approved {
            PipelineState::Approved {
                attempts: attempt,
                draft,
            }
        } else if attempt < max_attempts {
            PipelineState::Drafting {
                attempt: attempt + 1,
                feedback: Some(verdict),
            }
        } else {
            PipelineState::Exhausted {
                attempts: attempt,
                draft,
                verdict,
            }
        }
    }
}
