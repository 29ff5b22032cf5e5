use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Represents each line type in the run JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLine {
    RunStart {
        timestamp: DateTime<Utc>,
        repository: String,
        generator_model: String,
        reviewer_model: String,
        max_attempts: usize,
    },
    Change {
        pr_number: u64,
        title: String,
        url: Option<String>,
        /// published / skipped / filtered / failed
        outcome: String,
        review_status: Option<String>,
        review_attempts: Option<usize>,
        issues: usize,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    RunEnd {
        published: usize,
        skipped: usize,
        filtered: usize,
        failed: usize,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },
}

/// Writes one batch run as JSONL to ~/.local/share/prpress/runs/.
pub struct RunLog {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl RunLog {
    /// Create a run log in the default data directory
    pub fn new(repository: &str) -> io::Result<Self> {
        Self::in_dir(&Self::runs_dir()?, repository)
    }

    /// Create a run log in `dir`. The file name is the current UTC timestamp
    /// and a short hash of the repository name, with a `-N` suffix when a
    /// log for the same repository already exists for that second.
    pub fn in_dir(dir: &Path, repository: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let timestamp_str = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(repository.as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let stem = format!("{}_{}", timestamp_str, short_hash);
        let mut suffix = 0usize;
        loop {
            let name = if suffix == 0 {
                format!("{}.jsonl", stem)
            } else {
                format!("{}-{}.jsonl", stem, suffix)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        file: Mutex::new(BufWriter::new(file)),
                        path,
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Returns the path to the run file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_start(
        &self,
        repository: &str,
        generator_model: &str,
        reviewer_model: &str,
        max_attempts: usize,
    ) {
        self.write_line(&RunLine::RunStart {
            timestamp: Utc::now(),
            repository: repository.to_string(),
            generator_model: generator_model.to_string(),
            reviewer_model: reviewer_model.to_string(),
            max_attempts,
        });
    }

    /// Write a per-change line. Accepts individual fields so this crate
    /// does not depend on the pipeline types.
    #[allow(clippy::too_many_arguments)]
    pub fn write_change(
        &self,
        pr_number: u64,
        title: &str,
        url: Option<&str>,
        outcome: &str,
        review_status: Option<&str>,
        review_attempts: Option<usize>,
        issues: usize,
        error: Option<&str>,
    ) {
        self.write_line(&RunLine::Change {
            pr_number,
            title: title.to_string(),
            url: url.map(String::from),
            outcome: outcome.to_string(),
            review_status: review_status.map(String::from),
            review_attempts,
            issues,
            error: error.map(String::from),
            timestamp: Utc::now(),
        });
    }

    pub fn write_end(
        &self,
        published: usize,
        skipped: usize,
        filtered: usize,
        failed: usize,
        duration_secs: f64,
    ) {
        self.write_line(&RunLine::RunEnd {
            published,
            skipped,
            filtered,
            failed,
            duration_secs,
            timestamp: Utc::now(),
        });
    }

    fn write_line(&self, line: &RunLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn runs_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Ok(data_dir.join("prpress").join("runs"))
    }
}
