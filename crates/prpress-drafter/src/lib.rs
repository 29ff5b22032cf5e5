//! # prpress-drafter
//!
//! Turns a merged pull request into a draft article.
//!
//! ## Key Types
//!
//! - [`PullRequestChange`] - The change record a draft is written from
//! - [`DraftAttempt`] - One decoded generation result (article or skip)
//! - [`Drafter`] - Capability trait the orchestrator drives
//! - [`ServiceDrafter`] - [`Drafter`] backed by a generative-text service
//! - [`NoiseFilter`] - Drops bot and housekeeping pull requests before drafting

mod attempt;
mod change;
pub mod drafter;
mod noise;
mod prompts;

pub use attempt::{DraftAttempt, DraftParseError, DEFAULT_SKIP_SENTINEL};
pub use change::{DiffEntry, FileStatus, PullRequestChange};
pub use drafter::{DraftError, Drafter, DrafterConfig, ServiceDrafter};
pub use noise::NoiseFilter;
pub use prompts::DraftPrompts;
