use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::strip_code_fence;

/// How serious a review issue is
///
/// Only the exact lowercase spellings map to the named levels. Anything else,
/// including `"CRITICAL"`, is kept verbatim in `Other` so it serializes back
/// exactly as reported; use [`Severity::is_critical`] for counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Other(s) => s,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.as_str().eq_ignore_ascii_case("critical")
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Other(s),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// e.g. "guideline", "technical", "style"
    pub category: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
}

/// The reviewer's structured judgment of one draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub approved: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub overall_feedback: String,
}

#[derive(Error, Debug)]
pub enum ReviewParseError {
    #[error("Reviewer returned an empty response")]
    Empty,

    #[error("Failed to parse review verdict JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

impl ReviewVerdict {
    pub fn approve() -> Self {
        Self {
            approved: true,
            issues: Vec::new(),
            overall_feedback: String::new(),
        }
    }

    pub fn reject(issues: Vec<Issue>, overall_feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            issues,
            overall_feedback: overall_feedback.into(),
        }
    }

    /// Parse a verdict from the reviewer's response text
    ///
    /// Expected format (optionally wrapped in a ```json fence):
    /// ```text
    /// {"approved": false, "issues": [{"category": "...", "severity": "critical",
    ///  "description": "...", "suggestion": "..."}], "overall_feedback": "..."}
    /// ```
    pub fn parse(text: &str) -> Result<Self, ReviewParseError> {
        debug!(output_len = text.len(), "Parsing review verdict");

        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(ReviewParseError::Empty);
        }

        Ok(serde_json::from_str(body)?)
    }

    pub fn critical_issues(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity.is_critical())
            .count()
    }

    /// Get a short description of the verdict for logging
    pub fn short_description(&self) -> String {
        if self.approved {
            "APPROVED".to_string()
        } else if self.issues.is_empty() {
            "REJECTED".to_string()
        } else {
            format!("REJECTED ({} issues)", self.issues.len())
        }
    }

    /// One line per issue, used in logs and in revision prompts
    pub fn issue_lines(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|issue| {
                let mut line = format!(
                    "[{}/{}] {}",
                    issue.severity, issue.category, issue.description
                );
                if !issue.suggestion.is_empty() {
                    line.push_str(&format!(" (suggestion: {})", issue.suggestion));
                }
                line
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_approved_verdict() {
        let verdict =
            ReviewVerdict::parse(r#"{"approved": true, "issues": [], "overall_feedback": ""}"#)
                .unwrap();
        assert_eq!(verdict, ReviewVerdict::approve());
        assert_eq!(verdict.short_description(), "APPROVED");
    }

    #[test]
    fn test_parse_rejected_verdict() {
        let output = r#"
```json
{
  "approved": false,
  "issues": [
    {
      "category": "guideline",
      "severity": "critical",
      "description": "Not enough technical detail",
      "suggestion": "Add a code example"
    },
    {"category": "style", "severity": "minor", "description": "Long title"}
  ],
  "overall_feedback": "Needs more detail"
}
```
"#;

        let verdict = ReviewVerdict::parse(output).unwrap();
        assert!(!verdict.approved);
        assert_eq!(verdict.issues.len(), 2);
        assert_eq!(verdict.issues[0].severity, Severity::Critical);
        assert_eq!(verdict.issues[1].severity, Severity::Other("minor".into()));
        assert_eq!(verdict.issues[1].suggestion, "");
        assert_eq!(verdict.critical_issues(), 1);
        assert_eq!(verdict.short_description(), "REJECTED (2 issues)");
    }

    #[test]
    fn test_optional_fields_default() {
        let verdict = ReviewVerdict::parse(r#"{"approved": false}"#).unwrap();
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.overall_feedback, "");
    }

    #[test]
    fn test_missing_approved_is_error() {
        let result = ReviewVerdict::parse(r#"{"issues": []}"#);
        assert!(matches!(result, Err(ReviewParseError::JsonParseError(_))));
    }

    #[test]
    fn test_non_boolean_approved_is_error() {
        let result = ReviewVerdict::parse(r#"{"approved": "yes"}"#);
        assert!(matches!(result, Err(ReviewParseError::JsonParseError(_))));
    }

    #[test]
    fn test_free_text_is_error() {
        let result = ReviewVerdict::parse("Looks good to me!");
        assert!(matches!(result, Err(ReviewParseError::JsonParseError(_))));
        assert!(matches!(
            ReviewVerdict::parse("   \n"),
            Err(ReviewParseError::Empty)
        ));
    }

    #[test]
    fn test_severity_round_trips_unknown_values() {
        let issue = Issue {
            category: "technical".into(),
            severity: Severity::Other("Blocker".into()),
            description: "x".into(),
            suggestion: String::new(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "Blocker");

        let known: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(known, Severity::Warning);

        let shouted: Severity = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(serde_json::to_value(&shouted).unwrap(), "WARNING");
    }

    #[test]
    fn test_critical_count_ignores_case() {
        let issue = |severity: &str| Issue {
            category: "technical".into(),
            severity: Severity::from(severity.to_string()),
            description: "x".into(),
            suggestion: String::new(),
        };
        let verdict = ReviewVerdict::reject(
            vec![issue("critical"), issue("CRITICAL"), issue("Warning")],
            "",
        );
        assert_eq!(verdict.critical_issues(), 2);
        assert_eq!(verdict.issues[1].severity.as_str(), "CRITICAL");
    }

    #[test]
    fn test_issue_lines() {
        let verdict = ReviewVerdict::reject(
            vec![Issue {
                category: "technical".into(),
                severity: Severity::Warning,
                description: "Minor inaccuracy".into(),
                suggestion: "Double-check the flag name".into(),
            }],
            "Close",
        );
        assert_eq!(
            verdict.issue_lines(),
            vec!["[warning/technical] Minor inaccuracy (suggestion: Double-check the flag name)"]
        );
    }
}
