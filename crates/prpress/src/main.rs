mod config;
mod input;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use prpress_core::{
    BatchReport, BatchRunner, ChangeStatus, ErrorKind, Orchestrator, PipelineConfig,
    DEFAULT_MAX_ATTEMPTS,
};
use prpress_drafter::{DrafterConfig, NoiseFilter, ServiceDrafter, DEFAULT_SKIP_SENTINEL};
use prpress_logging::{init_tracing, LogFormat, Logger, RunLog};
use prpress_reviewer::ServiceReviewer;
use prpress_service::{create_service, ServiceConfig, ServiceKind, TextService};

use crate::config::{ProjectConfig, RoleConfig};
use crate::input::{group_by_repository, load_changes};

#[derive(Parser, Debug)]
#[command(
    name = "prpress",
    about = "Turns merged pull requests into reviewed articles",
    version,
    author
)]
struct Cli {
    /// JSON file with one change or an array of changes
    #[arg(short, long)]
    input: PathBuf,

    /// Working directory holding prpress.toml (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Draft/review cycles before the last draft is accepted (default: 3)
    #[arg(short = 'n', long)]
    max_attempts: Option<usize>,

    /// Changes processed at the same time (default: 1)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Service that writes the drafts
    #[arg(long, value_enum)]
    drafter: Option<ServiceChoice>,

    /// Service that reviews the drafts
    #[arg(long, value_enum)]
    reviewer: Option<ServiceChoice>,

    /// Model for the drafter
    #[arg(long)]
    drafter_model: Option<String>,

    /// Model for the reviewer
    #[arg(long)]
    reviewer_model: Option<String>,

    /// Literal the drafter answers with to decline a change
    #[arg(long)]
    skip_sentinel: Option<String>,

    /// Draft every change, including housekeeping ones
    #[arg(long)]
    no_filter: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Tracing level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also append events as JSON lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory for run records (default: the user data directory)
    #[arg(long)]
    run_log_dir: Option<PathBuf>,

    /// Do not write a run record
    #[arg(long)]
    no_run_log: bool,

    /// Output the batch reports as JSON
    #[arg(long)]
    json_output: bool,

    /// Dry run: show what would happen without calling any service
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ServiceChoice {
    Anthropic,
    Gemini,
}

impl From<ServiceChoice> for ServiceKind {
    fn from(choice: ServiceChoice) -> Self {
        match choice {
            ServiceChoice::Anthropic => ServiceKind::Anthropic,
            ServiceChoice::Gemini => ServiceKind::Gemini,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Exit code when the user interrupted the run
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let groups = group_by_repository(load_changes(&cli.input)?);

    let pipeline = PipelineConfig::default().with_max_attempts(
        cli.max_attempts
            .or(project.pipeline.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS),
    );
    let concurrency = cli.concurrency.or(project.pipeline.concurrency).unwrap_or(1);
    let noise_filter = !cli.no_filter && project.pipeline.noise_filter.unwrap_or(true);

    let drafter_config = DrafterConfig::default().with_skip_sentinel(
        cli.skip_sentinel
            .clone()
            .or_else(|| project.skip_sentinel.clone())
            .unwrap_or_else(|| DEFAULT_SKIP_SENTINEL.to_string()),
    );
    drafter_config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid drafter configuration")?;

    let drafter_kind = match cli.drafter {
        Some(choice) => choice.into(),
        None => project.drafter.service_kind(ServiceKind::Anthropic)?,
    };
    let reviewer_kind = match cli.reviewer {
        Some(choice) => choice.into(),
        None => project.reviewer.service_kind(ServiceKind::Gemini)?,
    };

    if cli.dry_run {
        let filter = NoiseFilter::new();
        println!("=== Dry Run ===");
        println!("Input: {}", cli.input.display());
        println!(
            "Drafter: {} ({})",
            drafter_kind,
            cli.drafter_model
                .as_deref()
                .or(project.drafter.model.as_deref())
                .unwrap_or(drafter_kind.default_model())
        );
        println!(
            "Reviewer: {} ({})",
            reviewer_kind,
            cli.reviewer_model
                .as_deref()
                .or(project.reviewer.model.as_deref())
                .unwrap_or(reviewer_kind.default_model())
        );
        println!("Max attempts: {}", pipeline.max_attempts);
        println!("Concurrency: {}", concurrency);
        println!("Skip sentinel: {}", drafter_config.skip_sentinel);
        for group in &groups {
            println!("{} ({} changes)", group.repository, group.changes.len());
            for change in &group.changes {
                let note = match filter.reason(change) {
                    Some(reason) if noise_filter => format!("filtered: {}", reason),
                    _ if change.diff_entries.is_empty() => "no diff entries".to_string(),
                    _ => "draft".to_string(),
                };
                println!("  #{} {} [{}]", change.pr_number, change.title, note);
            }
        }
        return Ok(());
    }

    let drafter_service = build_service(
        drafter_kind,
        &project.drafter,
        cli.drafter_model.as_deref(),
        concurrency,
        false,
    )?;
    let reviewer_service = build_service(
        reviewer_kind,
        &project.reviewer,
        cli.reviewer_model.as_deref(),
        concurrency,
        true,
    )?;

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(ServiceDrafter::with_config(drafter_service, drafter_config)),
        Arc::new(ServiceReviewer::new(reviewer_service)),
        pipeline,
        Arc::new(logger),
    )?);

    // Handle Ctrl+C gracefully
    let interrupt_handle = orchestrator.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finishing in-flight service calls...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let runner = BatchRunner::new(orchestrator.clone(), concurrency).with_noise_filter(noise_filter);

    let mut reports = Vec::with_capacity(groups.len());
    for group in groups {
        let run_log = if cli.no_run_log {
            None
        } else {
            open_run_log(cli.run_log_dir.as_deref(), &group.repository)
        };

        if let Some(ref run_log) = run_log {
            run_log.write_start(
                &group.repository,
                orchestrator.generator_model(),
                orchestrator.reviewer_model(),
                orchestrator.config().max_attempts,
            );
        }

        let report = runner.run(&group.repository, group.changes).await;

        if let Some(ref run_log) = run_log {
            write_run_log(run_log, &report);
        }
        reports.push(report);
    }

    if cli.json_output {
        let json = serde_json::to_string_pretty(&reports)?;
        println!("{}", json);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    std::process::exit(exit_code(&reports));
}

fn build_service(
    kind: ServiceKind,
    role: &RoleConfig,
    model_override: Option<&str>,
    concurrency: usize,
    json_response: bool,
) -> Result<Arc<dyn TextService>> {
    // Drafts may be the bare skip sentinel, so only verdicts are forced into JSON mode
    let config = ServiceConfig::new(kind, api_key(kind)?)
        .with_max_concurrent_requests(concurrency)
        .with_json_response(json_response);
    let config = role.apply(config, model_override);
    create_service(kind, config).with_context(|| format!("Failed to create {} service", kind))
}

fn api_key(kind: ServiceKind) -> Result<String> {
    let var = match kind {
        ServiceKind::Anthropic => "ANTHROPIC_API_KEY",
        ServiceKind::Gemini => "GEMINI_API_KEY",
    };
    std::env::var(var).with_context(|| format!("{} is not set", var))
}

fn open_run_log(dir: Option<&Path>, repository: &str) -> Option<RunLog> {
    let result = match dir {
        Some(dir) => RunLog::in_dir(dir, repository),
        None => RunLog::new(repository),
    };
    match result {
        Ok(run_log) => Some(run_log),
        Err(e) => {
            eprintln!("Warning: could not create run log: {}", e);
            None
        }
    }
}

fn write_run_log(run_log: &RunLog, report: &BatchReport) {
    for change in &report.changes {
        let (review_status, review_attempts, issues, error) = match &change.status {
            ChangeStatus::Published(result) => (
                Some(result.review_status.as_str()),
                Some(result.review_attempts),
                result.review_issues.len(),
                None,
            ),
            ChangeStatus::Failed { error, .. } => (None, None, 0, Some(error.as_str())),
            ChangeStatus::Skipped | ChangeStatus::Filtered { .. } => (None, None, 0, None),
        };
        run_log.write_change(
            change.pr_number,
            &change.title,
            change.url.as_deref(),
            change.status.as_str(),
            review_status,
            review_attempts,
            issues,
            error,
        );
    }
    run_log.write_end(
        report.published(),
        report.skipped(),
        report.filtered(),
        report.failed(),
        report.duration_secs,
    );
}

fn print_report(report: &BatchReport) {
    eprintln!();
    eprintln!("=== {} ===", report.repository.bold());

    for change in &report.changes {
        match &change.status {
            ChangeStatus::Published(result) => {
                let status = match result.review_status.as_str() {
                    "approved" => "approved".green(),
                    other => other.yellow(),
                };
                eprintln!(
                    "  #{} {} [{}, {} attempt(s)]",
                    change.pr_number, change.title, status, result.review_attempts
                );
                for issue in &result.review_issues {
                    eprintln!(
                        "      {} [{}/{}] {}",
                        "-".dimmed(),
                        issue.severity,
                        issue.category,
                        issue.description
                    );
                }
            }
            ChangeStatus::Skipped => {
                eprintln!("  #{} {} [{}]", change.pr_number, change.title, "skipped".dimmed());
            }
            ChangeStatus::Filtered { reason } => {
                eprintln!(
                    "  #{} {} [{}: {}]",
                    change.pr_number,
                    change.title,
                    "filtered".dimmed(),
                    reason
                );
            }
            ChangeStatus::Failed { kind, error } => {
                eprintln!(
                    "  #{} {} [{}]",
                    change.pr_number,
                    change.title,
                    format!("failed: {}", kind).red()
                );
                eprintln!("      {}", error);
            }
        }
    }

    eprintln!(
        "Published: {}  Skipped: {}  Filtered: {}  Failed: {}  Duration: {:.1}s",
        report.published(),
        report.skipped(),
        report.filtered(),
        report.failed(),
        report.duration_secs
    );
}

/// 0 when every change succeeded, 1 on any failure, 130 if interrupted
fn exit_code(reports: &[BatchReport]) -> i32 {
    let kinds: Vec<ErrorKind> = reports
        .iter()
        .flat_map(|r| r.changes.iter())
        .filter_map(|c| match c.status {
            ChangeStatus::Failed { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();

    if kinds.contains(&ErrorKind::Interrupted) {
        EXIT_INTERRUPTED
    } else if kinds.is_empty() {
        0
    } else {
        1
    }
}
