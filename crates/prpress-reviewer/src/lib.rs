mod json_block;
mod prompts;
pub mod reviewer;
mod verdict;

pub use json_block::strip_code_fence;
pub use prompts::ReviewPrompts;
pub use reviewer::{ReviewError, Reviewer, ServiceReviewer};
pub use verdict::{Issue, ReviewParseError, ReviewVerdict, Severity};
