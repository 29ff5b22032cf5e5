use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Draft→review cycles before the last draft is accepted as is
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Configuration for one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_attempts: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_attempts == 0 {
            return Err(PipelineError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_three_attempts() {
        assert_eq!(PipelineConfig::default().max_attempts, 3);
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_is_invalid() {
        let config = PipelineConfig::default().with_max_attempts(0);
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigError(_))
        ));
    }
}
