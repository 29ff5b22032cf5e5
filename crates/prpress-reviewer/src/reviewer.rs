use async_trait::async_trait;
use prpress_service::{ServiceError, ServicePrompt, TextService};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{ReviewParseError, ReviewPrompts, ReviewVerdict};

/// Judges a draft article against the editorial guidelines
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Identifier of the model behind this reviewer, reported verbatim to callers
    fn model(&self) -> &str;

    /// Review one draft. `attempt` is the 1-based draft number.
    async fn review(&self, article: &str, attempt: usize) -> Result<ReviewVerdict, ReviewError>;
}

/// Reviewer backed by a generative-text service
pub struct ServiceReviewer {
    service: Arc<dyn TextService>,
}

impl ServiceReviewer {
    pub fn new(service: Arc<dyn TextService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Reviewer for ServiceReviewer {
    fn model(&self) -> &str {
        self.service.model()
    }

    async fn review(&self, article: &str, attempt: usize) -> Result<ReviewVerdict, ReviewError> {
        if article.trim().is_empty() {
            return Err(ReviewError::EmptyArticle);
        }

        let prompt = ServicePrompt::new(
            ReviewPrompts::guidelines(),
            ReviewPrompts::build_review_prompt(article, attempt),
        );

        debug!(
            prompt_len = prompt.user.len(),
            attempt, "Running article review"
        );

        let reply = self.service.complete(&prompt).await?;

        info!(
            service = self.service.name(),
            duration_secs = reply.duration.as_secs_f64(),
            "Reviewer completed"
        );

        Ok(ReviewVerdict::parse(&reply.text)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Article to review is empty")]
    EmptyArticle,

    #[error("Review service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Failed to parse review verdict: {0}")]
    ParseError(#[from] ReviewParseError),
}

impl ReviewError {
    /// True when the reviewer answered but the answer could not be decoded
    pub fn is_malformed(&self) -> bool {
        match self {
            ReviewError::ParseError(_) => true,
            ReviewError::ServiceError(e) => e.is_malformed(),
            ReviewError::EmptyArticle => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prpress_service::ServiceReply;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedService {
        reply: Result<String, fn() -> ServiceError>,
        prompts: Mutex<Vec<ServicePrompt>>,
    }

    impl CannedService {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextService for CannedService {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "gemini-test"
        }

        async fn complete(&self, prompt: &ServicePrompt) -> Result<ServiceReply, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            match &self.reply {
                Ok(text) => Ok(ServiceReply::new(text.clone(), Duration::from_millis(5))),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn test_review_sends_guidelines_and_article() {
        let service = CannedService::ok(r#"{"approved": true, "issues": []}"#);
        let reviewer = ServiceReviewer::new(service.clone());

        let verdict = reviewer.review("# [a/b] Title", 1).await.unwrap();
        assert!(verdict.approved);
        assert_eq!(reviewer.model(), "gemini-test");

        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].system, ReviewPrompts::guidelines());
        assert!(prompts[0].user.contains("# [a/b] Title"));
    }

    #[tokio::test]
    async fn test_empty_article_is_rejected_before_calling_service() {
        let service = CannedService::ok(r#"{"approved": true}"#);
        let reviewer = ServiceReviewer::new(service.clone());

        let err = reviewer.review("  ", 1).await.unwrap_err();
        assert!(matches!(err, ReviewError::EmptyArticle));
        assert!(service.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_verdict_is_malformed() {
        let reviewer = ServiceReviewer::new(CannedService::ok("The article is fine."));
        let err = reviewer.review("# Title", 1).await.unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn test_transport_error_is_not_malformed() {
        let service = Arc::new(CannedService {
            reply: Err(|| ServiceError::Timeout(Duration::from_secs(30))),
            prompts: Mutex::new(Vec::new()),
        });
        let reviewer = ServiceReviewer::new(service);
        let err = reviewer.review("# Title", 1).await.unwrap_err();
        assert!(matches!(err, ReviewError::ServiceError(ServiceError::Timeout(_))));
        assert!(!err.is_malformed());
    }
}
