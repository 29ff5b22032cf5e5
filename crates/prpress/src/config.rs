//! Project configuration file support for prpress.
//!
//! Loads configuration from `prpress.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use prpress_service::{ServiceConfig, ServiceKind};

/// Project-level configuration loaded from `prpress.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Literal the drafter answers with to decline a change
    pub skip_sentinel: Option<String>,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub drafter: RoleConfig,
    #[serde(default)]
    pub reviewer: RoleConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    pub max_attempts: Option<usize>,
    /// Changes processed at the same time
    pub concurrency: Option<usize>,
    /// Apply the housekeeping filter before drafting (default: true)
    pub noise_filter: Option<bool>,
}

/// Configuration for one service role (drafter or reviewer)
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    /// `anthropic` or `gemini`
    pub service: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "prpress.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

impl RoleConfig {
    /// Service for this role, falling back to `default`
    pub fn service_kind(&self, default: ServiceKind) -> Result<ServiceKind> {
        match self.service.as_deref() {
            Some(name) => name
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid service '{}' in {}", name, CONFIG_FILE_NAME)),
            None => Ok(default),
        }
    }

    /// Layer this role's settings over the service defaults.
    /// `model_override` (from the command line) wins over the file.
    pub fn apply(&self, mut config: ServiceConfig, model_override: Option<&str>) -> ServiceConfig {
        if let Some(model) = model_override.or(self.model.as_deref()) {
            config = config.with_model(model.to_string());
        }
        if let Some(ref api_url) = self.api_url {
            config = config.with_api_url(api_url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_full_file_parses() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
skip_sentinel = "NO_ARTICLE"

[pipeline]
max_attempts = 5
concurrency = 2
noise_filter = false

[drafter]
service = "anthropic"
model = "claude-opus-4-1"
timeout_secs = 300

[reviewer]
service = "gemini"
api_url = "http://localhost:9999/v1beta"
max_tokens = 2048
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.skip_sentinel.as_deref(), Some("NO_ARTICLE"));
        assert_eq!(config.pipeline.max_attempts, Some(5));
        assert_eq!(config.pipeline.concurrency, Some(2));
        assert_eq!(config.pipeline.noise_filter, Some(false));
        assert_eq!(
            config.drafter.service_kind(ServiceKind::Gemini).unwrap(),
            ServiceKind::Anthropic
        );
        assert_eq!(config.reviewer.max_tokens, Some(2048));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[pipeline]\nmax_retries = 2\n",
        )
        .unwrap();

        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_unknown_service_is_an_error() {
        let role = RoleConfig {
            service: Some("openai".into()),
            ..Default::default()
        };
        assert!(role.service_kind(ServiceKind::Anthropic).is_err());
    }

    #[test]
    fn test_apply_layers_settings() {
        let role = RoleConfig {
            model: Some("claude-from-file".into()),
            timeout_secs: Some(30),
            max_tokens: Some(1024),
            ..Default::default()
        };
        let base = ServiceConfig::new(ServiceKind::Anthropic, "key".into());

        let config = role.apply(base.clone(), None);
        assert_eq!(config.model, "claude-from-file");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.api_url, base.api_url);

        let config = role.apply(base, Some("claude-from-cli"));
        assert_eq!(config.model, "claude-from-cli");
    }
}
