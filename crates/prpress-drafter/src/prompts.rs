use prpress_reviewer::ReviewVerdict;

use crate::PullRequestChange;

/// Longest patch text included per file
const MAX_PATCH_CHARS: usize = 4_000;

/// Longest combined diff section included in one prompt
const MAX_DIFF_CHARS: usize = 40_000;

/// Prompt templates for the drafter
pub struct DraftPrompts;

impl DraftPrompts {
    /// Fixed style instructions. `skip_sentinel` is the literal the model
    /// answers with when the change does not deserve an article.
    pub fn system(skip_sentinel: &str) -> String {
        format!(
            r#"You are a technical writer who turns merged pull requests into short articles for developers who use the project.

## Writing Rules

- Start with exactly one top-level heading: `# [owner/repo] Short description of the change`
- Explain what changed, why it matters, and how to use it
- Include a short code example when the change touches public API or configuration
- Only state what the diff and description support; never invent behaviour
- Plain, practical tone; no marketing language

## When Not To Write

If the change is trivial for readers (internal refactor with no visible effect, test-only change, version bump, formatting), reply with exactly:

{sentinel}

and nothing else.

## Required Response Format

Otherwise reply with a single JSON object and nothing else:

{{"article": "Full article in Markdown", "summary": "One or two plain-text sentences"}}"#,
            sentinel = skip_sentinel,
        )
    }

    /// Build the prompt for the first draft
    pub fn build_generation_prompt(change: &PullRequestChange) -> String {
        format!(
            r#"Write an article about this merged pull request.

## Repository
{repo}

## Pull Request #{number}: {title}

{body}

## Changed Files ({files} files, +{additions}/-{deletions})
{diff}"#,
            repo = change.repository_name,
            number = change.pr_number,
            title = change.title,
            body = non_empty_or(change.body_text(), "(no description)"),
            files = change.diff_entries.len(),
            additions = change.total_additions(),
            deletions = change.total_deletions(),
            diff = format_diff(change),
        )
    }

    /// Build the prompt for a redraft, steering away from the prior issues
    pub fn build_revision_prompt(change: &PullRequestChange, prior: &ReviewVerdict) -> String {
        let issues = prior
            .issue_lines()
            .into_iter()
            .map(|line| format!("- {}", line))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"{original}

## Previous Draft Review
The previous draft was rejected by the editor.

Overall feedback: {feedback}

Issues:
{issues}

Write a new article that resolves every issue listed above. Focus specifically on the critical issues."#,
            original = Self::build_generation_prompt(change),
            feedback = non_empty_or(&prior.overall_feedback, "(none)"),
            issues = non_empty_or(&issues, "- (no specific issues given)"),
        )
    }
}

fn format_diff(change: &PullRequestChange) -> String {
    let mut out = String::new();

    for entry in &change.diff_entries {
        let section = format!(
            "### {} ({}, +{} -{})\n```diff\n{}\n```\n",
            entry.filename,
            entry.status,
            entry.additions,
            entry.deletions,
            truncate_output(
                entry.patch.as_deref().unwrap_or("(binary or no textual diff)"),
                MAX_PATCH_CHARS
            ),
        );

        if out.len() + section.len() > MAX_DIFF_CHARS {
            out.push_str("\n(remaining files omitted)\n");
            break;
        }
        out.push_str(&section);
    }

    out
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

/// Truncate at a line boundary, never splitting a UTF-8 character
fn truncate_output(output: &str, max_len: usize) -> &str {
    if output.len() <= max_len {
        return output;
    }

    let mut cut = max_len;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }

    match output[..cut].rfind('\n') {
        Some(pos) => &output[..pos],
        None => &output[..cut],
    }
}
