use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use prpress_core::PullRequestChange;

#[derive(Deserialize)]
#[serde(untagged)]
enum ChangesFile {
    Many(Vec<PullRequestChange>),
    One(Box<PullRequestChange>),
}

/// Changes of one repository, in file order
#[derive(Debug)]
pub struct RepositoryChanges {
    pub repository: String,
    pub changes: Vec<PullRequestChange>,
}

/// Read a JSON file holding one change or an array of changes
pub fn load_changes(path: &Path) -> Result<Vec<PullRequestChange>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_changes(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_changes(content: &str) -> Result<Vec<PullRequestChange>> {
    let changes = match serde_json::from_str(content)? {
        ChangesFile::Many(changes) => changes,
        ChangesFile::One(change) => vec![*change],
    };
    Ok(changes)
}

/// Group changes by repository, keeping first-seen order
pub fn group_by_repository(changes: Vec<PullRequestChange>) -> Vec<RepositoryChanges> {
    let mut groups: Vec<RepositoryChanges> = Vec::new();

    for change in changes {
        match groups
            .iter_mut()
            .find(|g| g.repository == change.repository_name)
        {
            Some(group) => group.changes.push(change),
            None => groups.push(RepositoryChanges {
                repository: change.repository_name.clone(),
                changes: vec![change],
            }),
        }
    }

    groups
}
