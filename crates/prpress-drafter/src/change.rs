use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File status as reported by the source-code host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// One file of a pull request diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub filename: String,
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
    /// Unified diff hunk text; absent for binary or oversized files
    #[serde(default)]
    pub patch: Option<String>,
}

/// A merged pull request and its diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestChange {
    /// `owner/repo`
    pub repository_name: String,
    pub pr_number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Source URL of the pull request, used by callers for deduplication
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Login of the pull request author
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, alias = "diff")]
    pub diff_entries: Vec<DiffEntry>,
}

impl PullRequestChange {
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn total_additions(&self) -> u32 {
        self.diff_entries.iter().map(|e| e.additions).sum()
    }

    pub fn total_deletions(&self) -> u32 {
        self.diff_entries.iter().map(|e| e.deletions).sum()
    }

    /// Short `owner/repo#123` label for logs and errors
    pub fn label(&self) -> String {
        format!("{}#{}", self.repository_name, self.pr_number)
    }
}
