use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One request to a generative-text service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrompt {
    /// Fixed instructions (style, guidelines)
    pub system: String,
    /// Per-call content
    pub user: String,
}

impl ServicePrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Text returned by a service call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReply {
    /// Concatenated text blocks of the vendor response
    pub text: String,
    /// Wall-clock duration of the call
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ServiceReply {
    pub fn new(text: String, duration: Duration) -> Self {
        Self { text, duration }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
