use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::{ServiceConfig, ServiceError};

/// Longest error body kept in a [`ServiceError`]
const MAX_ERROR_BODY: usize = 500;

/// Pooled HTTP client shared by every clone of an adapter
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            timeout: config.timeout,
        })
    }

    /// POST a JSON body and decode the JSON response envelope
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<(R, Duration), ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ServiceError::ConfigError("Request limiter closed".to_string()))?;

        let start = Instant::now();
        debug!(url = %redact_query(url), "Sending service request");

        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            let status = status.as_u16();
            return Err(match status {
                401 | 403 => ServiceError::Unauthorized { status, body },
                _ => ServiceError::Status { status, body },
            });
        }

        let text = response.text().await.map_err(|e| self.classify(e))?;
        let duration = start.elapsed();
        trace!(bytes = text.len(), "Service response body");

        let envelope = serde_json::from_str(&text)
            .map_err(|e| ServiceError::MalformedEnvelope(format!("Invalid JSON envelope: {}", e)))?;

        debug!(
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Service request completed"
        );

        Ok((envelope, duration))
    }

    fn classify(&self, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::Request(error)
        }
    }
}

fn truncate_body(body: String) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body
    } else {
        let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", truncated)
    }
}

fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
