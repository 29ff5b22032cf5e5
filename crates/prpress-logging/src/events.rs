use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Which external service an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    Drafter,
    Reviewer,
}

impl std::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceRole::Drafter => write!(f, "drafter"),
            ServiceRole::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// Structured log events for the article pipeline
///
/// Attempt numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    BatchStarted {
        repository: String,
        changes: usize,
    },
    ChangeFiltered {
        pr_number: u64,
        reason: String,
    },
    PipelineStarted {
        repository: String,
        pr_number: u64,
        title: String,
    },
    DraftStarted {
        pr_number: u64,
        attempt: usize,
    },
    DraftCompleted {
        pr_number: u64,
        attempt: usize,
        skipped: bool,
        duration_secs: f64,
    },
    ReviewStarted {
        pr_number: u64,
        attempt: usize,
    },
    ReviewCompleted {
        pr_number: u64,
        attempt: usize,
        verdict: String,
        duration_secs: f64,
    },
    PipelineCompleted {
        pr_number: u64,
        status: String,
        attempts: usize,
    },
    PipelineSkipped {
        pr_number: u64,
    },
    PipelineFailed {
        pr_number: u64,
        attempt: usize,
        role: Option<ServiceRole>,
        error: String,
    },
    BatchCompleted {
        repository: String,
        published: usize,
        skipped: usize,
        filtered: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for pipeline events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
    quiet: bool,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
            quiet: false,
        }
    }

    /// Logger that writes nothing to the console
    pub fn silent() -> Self {
        Self {
            format: LogFormat::Compact,
            file_writer: None,
            quiet: true,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
            quiet: false,
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        let line = match self.format {
            LogFormat::Json => serde_json::to_string(event).ok(),
            LogFormat::Pretty => Some(Self::format_pretty(event)),
            LogFormat::Compact => Some(Self::format_compact(event)),
        };

        if let Some(line) = line {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    fn format_pretty(event: &LogEvent) -> String {
        match event {
            LogEvent::BatchStarted {
                repository,
                changes,
            } => {
                let rule = "─".repeat(69).bright_blue();
                format!(
                    "\n{}\n  {} {}  {}\n{}\n",
                    rule,
                    "prpress".bold().bright_white(),
                    repository.bright_white(),
                    format!(
                        "{} pull {}",
                        changes,
                        if *changes == 1 { "request" } else { "requests" }
                    )
                    .dimmed(),
                    rule
                )
            }
            LogEvent::ChangeFiltered { pr_number, reason } => format!(
                "{} {}",
                format!("  · #{} filtered:", pr_number).dimmed(),
                reason.dimmed()
            ),
            LogEvent::PipelineStarted {
                pr_number, title, ..
            } => format!(
                "{}{}",
                "┌ ".bright_blue(),
                format!("#{} {}", pr_number, Self::truncate(title, 60))
                    .bright_blue()
                    .bold()
            ),
            LogEvent::DraftStarted { attempt, .. } => format!(
                "│ {} {}",
                "▶".bright_cyan(),
                format!("DRAFT {}", attempt).bright_cyan().bold()
            ),
            LogEvent::DraftCompleted {
                skipped,
                duration_secs,
                ..
            } => {
                if *skipped {
                    format!(
                        "│   {} Skip signalled ({:.1}s)",
                        "○".bright_yellow(),
                        duration_secs
                    )
                } else {
                    format!("│   {} Done ({:.1}s)", "✓".bright_green(), duration_secs)
                }
            }
            LogEvent::ReviewStarted { attempt, .. } => format!(
                "│ {} {}",
                "▶".bright_magenta(),
                format!("REVIEW {}", attempt).bright_magenta().bold()
            ),
            LogEvent::ReviewCompleted {
                verdict,
                duration_secs,
                ..
            } => {
                let text = format!("Verdict: {} ({:.1}s)", verdict, duration_secs);
                if verdict.starts_with("APPROVED") {
                    format!("│   {} {}", "✓".bright_green(), text.bright_green())
                } else {
                    format!("│   {} {}", "→".bright_yellow(), text.bright_yellow())
                }
            }
            LogEvent::PipelineCompleted {
                status, attempts, ..
            } => format!(
                "{} {} after {} {}\n",
                "└".bright_blue(),
                status.bright_green().bold(),
                attempts,
                if *attempts == 1 { "attempt" } else { "attempts" }
            ),
            LogEvent::PipelineSkipped { .. } => {
                format!("{} {}\n", "└".bright_blue(), "skipped".bright_yellow())
            }
            LogEvent::PipelineFailed {
                attempt,
                role,
                error,
                ..
            } => {
                let role = role.map(|r| format!(" ({})", r)).unwrap_or_default();
                format!(
                    "{} {} in attempt {}{}: {}\n",
                    "└".bright_blue(),
                    "✗ failed".bright_red().bold(),
                    attempt,
                    role,
                    error.bright_red()
                )
            }
            LogEvent::BatchCompleted {
                published,
                skipped,
                filtered,
                failed,
                duration_secs,
                ..
            } => {
                let failed_text = format!("{} failed", failed);
                format!(
                    "{} published, {} skipped, {} filtered, {} ({:.1}s)",
                    published.to_string().bright_green(),
                    skipped,
                    filtered,
                    if *failed > 0 {
                        failed_text.bright_red().to_string()
                    } else {
                        failed_text
                    },
                    duration_secs
                )
            }
        }
    }

    fn format_compact(event: &LogEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            LogEvent::BatchStarted {
                repository,
                changes,
            } => format!("[{}] batch:start {} n={}", timestamp, repository, changes),
            LogEvent::ChangeFiltered { pr_number, reason } => {
                format!("[{}] filter:#{} {}", timestamp, pr_number, reason)
            }
            LogEvent::PipelineStarted { pr_number, .. } => {
                format!("[{}] pipeline:start:#{}", timestamp, pr_number)
            }
            LogEvent::DraftStarted { pr_number, attempt } => {
                format!("[{}] draft:start:#{}:{}", timestamp, pr_number, attempt)
            }
            LogEvent::DraftCompleted {
                pr_number,
                attempt,
                skipped,
                duration_secs,
            } => format!(
                "[{}] draft:done:#{}:{}{} {:.1}s",
                timestamp,
                pr_number,
                attempt,
                if *skipped { " skip" } else { "" },
                duration_secs
            ),
            LogEvent::ReviewStarted { pr_number, attempt } => {
                format!("[{}] review:start:#{}:{}", timestamp, pr_number, attempt)
            }
            LogEvent::ReviewCompleted {
                pr_number,
                attempt,
                verdict,
                duration_secs,
            } => format!(
                "[{}] review:done:#{}:{} {} {:.1}s",
                timestamp, pr_number, attempt, verdict, duration_secs
            ),
            LogEvent::PipelineCompleted {
                pr_number,
                status,
                attempts,
            } => format!(
                "[{}] pipeline:done:#{} {} attempts={}",
                timestamp, pr_number, status, attempts
            ),
            LogEvent::PipelineSkipped { pr_number } => {
                format!("[{}] pipeline:skip:#{}", timestamp, pr_number)
            }
            LogEvent::PipelineFailed {
                pr_number,
                attempt,
                error,
                ..
            } => format!(
                "[{}] error:#{}:{} {}",
                timestamp, pr_number, attempt, error
            ),
            LogEvent::BatchCompleted {
                published,
                skipped,
                filtered,
                failed,
                duration_secs,
                ..
            } => format!(
                "[{}] batch:done published={} skipped={} filtered={} failed={} {:.1}s",
                timestamp, published, skipped, filtered, failed, duration_secs
            ),
        }
    }

    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() > max_chars {
            let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        }
    }
}
