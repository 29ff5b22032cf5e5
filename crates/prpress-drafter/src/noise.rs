use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::PullRequestChange;

/// Whole title words that mark housekeeping pull requests
static NOISE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(doc|readme|typo|ci|workflow|github actions)\b")
        .expect("noise title pattern is valid")
});

/// Labels that mark housekeeping pull requests
const NOISE_LABELS: &[&str] = &["documentation", "dependencies", "ci"];

const BOT_AUTHORS: &[&str] = &["dependabot[bot]"];

/// Drops pull requests that never warrant an article
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter;

impl NoiseFilter {
    pub fn new() -> Self {
        Self
    }

    /// Returns the reason a change is noise, or `None` if it should be drafted
    pub fn reason(&self, change: &PullRequestChange) -> Option<String> {
        if let Some(author) = change.author.as_deref() {
            if BOT_AUTHORS.contains(&author) {
                return Some(format!("authored by {}", author));
            }
        }

        if let Some(word) = NOISE_TITLE.find(&change.title) {
            return Some(format!("title mentions '{}'", word.as_str().to_lowercase()));
        }

        if let Some(label) = change
            .labels
            .iter()
            .find(|label| NOISE_LABELS.contains(&label.to_lowercase().as_str()))
        {
            return Some(format!("labelled '{}'", label));
        }

        None
    }

    pub fn is_noise(&self, change: &PullRequestChange) -> bool {
        let reason = self.reason(change);
        if let Some(ref reason) = reason {
            debug!(change = %change.label(), reason = %reason, "Filtered as noise");
        }
        reason.is_some()
    }
}
