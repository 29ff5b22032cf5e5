use prpress_reviewer::strip_code_fence;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Literal the drafter answers with when no article is warranted
pub const DEFAULT_SKIP_SENTINEL: &str = "SKIP";

/// One decoded generation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAttempt {
    /// 1-based attempt number
    pub attempt_index: usize,
    pub article_markdown: Option<String>,
    pub summary: Option<String>,
    pub is_skip: bool,
}

#[derive(Deserialize)]
struct DraftPayload {
    article: String,
    summary: String,
}

/// JSON-mode services wrap a bare sentinel in quotes
fn is_skip(text: &str, skip_sentinel: &str) -> bool {
    let text = text.trim();
    text == skip_sentinel
        || serde_json::from_str::<String>(text).is_ok_and(|s| s.trim() == skip_sentinel)
}

#[derive(Error, Debug)]
pub enum DraftParseError {
    #[error("Drafter returned an empty response")]
    Empty,

    #[error("Failed to parse draft JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Draft article is empty")]
    EmptyArticle,
}

impl DraftAttempt {
    pub fn skip(attempt_index: usize) -> Self {
        Self {
            attempt_index,
            article_markdown: None,
            summary: None,
            is_skip: true,
        }
    }

    pub fn article(attempt_index: usize, article: String, summary: String) -> Self {
        Self {
            attempt_index,
            article_markdown: Some(article),
            summary: Some(summary),
            is_skip: false,
        }
    }

    /// Parse a draft from the drafter's response text
    ///
    /// The whole response (ignoring surrounding whitespace) equal to
    /// `skip_sentinel`, bare or as a JSON string literal, is a skip. Otherwise the response must be a JSON
    /// object, optionally fenced:
    /// ```text
    /// {"article": "# [owner/repo] Title\n...", "summary": "..."}
    /// ```
    pub fn parse(
        attempt_index: usize,
        text: &str,
        skip_sentinel: &str,
    ) -> Result<Self, DraftParseError> {
        debug!(output_len = text.len(), attempt_index, "Parsing draft");

        if is_skip(text, skip_sentinel) {
            debug!(attempt_index, "Drafter signalled skip");
            return Ok(Self::skip(attempt_index));
        }

        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(DraftParseError::Empty);
        }

        let payload: DraftPayload = serde_json::from_str(body)?;
        if payload.article.trim().is_empty() {
            return Err(DraftParseError::EmptyArticle);
        }

        Ok(Self::article(attempt_index, payload.article, payload.summary))
    }

    pub fn article_text(&self) -> &str {
        self.article_markdown.as_deref().unwrap_or("")
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article() {
        let text = r##"{"article": "# [basecamp/kamal] Health checks\n\n...", "summary": "Kamal gained health checks."}"##;
        let attempt = DraftAttempt::parse(1, text, DEFAULT_SKIP_SENTINEL).unwrap();

        assert!(!attempt.is_skip);
        assert_eq!(attempt.attempt_index, 1);
        assert_eq!(attempt.article_text(), "# [basecamp/kamal] Health checks\n\n...");
        assert_eq!(attempt.summary_text(), "Kamal gained health checks.");
    }

    #[test]
    fn test_parse_fenced_article() {
        let text = "```json\n{\"article\": \"# T\", \"summary\": \"S\"}\n```";
        let attempt = DraftAttempt::parse(2, text, DEFAULT_SKIP_SENTINEL).unwrap();
        assert_eq!(attempt.article_text(), "# T");
    }

    #[test]
    fn test_parse_skip_sentinel() {
        assert_eq!(
            DraftAttempt::parse(1, "SKIP", DEFAULT_SKIP_SENTINEL).unwrap(),
            DraftAttempt::skip(1)
        );
        assert!(DraftAttempt::parse(1, "SKIP\n", DEFAULT_SKIP_SENTINEL)
            .unwrap()
            .is_skip);
    }

    #[test]
    fn test_parse_quoted_skip_sentinel() {
        assert!(DraftAttempt::parse(3, "\"SKIP\"\n", DEFAULT_SKIP_SENTINEL)
            .unwrap()
            .is_skip);
        assert!(matches!(
            DraftAttempt::parse(1, "\"skip\"", DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_skip_sentinel_is_case_sensitive() {
        assert!(matches!(
            DraftAttempt::parse(1, "skip", DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::JsonParseError(_))
        ));
        assert!(matches!(
            DraftAttempt::parse(1, "SKIP: trivial change", DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_custom_sentinel() {
        assert!(DraftAttempt::parse(1, "NO_ARTICLE", "NO_ARTICLE")
            .unwrap()
            .is_skip);
        assert!(DraftAttempt::parse(1, "SKIP", "NO_ARTICLE").is_err());
    }

    #[test]
    fn test_missing_fields_are_errors() {
        assert!(matches!(
            DraftAttempt::parse(1, r##"{"article": "# T"}"##, DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::JsonParseError(_))
        ));
        assert!(matches!(
            DraftAttempt::parse(1, r#"{"article": " ", "summary": "S"}"#, DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::EmptyArticle)
        ));
        assert!(matches!(
            DraftAttempt::parse(1, "", DEFAULT_SKIP_SENTINEL),
            Err(DraftParseError::Empty)
        ));
    }
}
