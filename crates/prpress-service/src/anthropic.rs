use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{HttpTransport, ServiceConfig, ServiceError, ServicePrompt, ServiceReply, TextService};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API adapter
#[derive(Clone)]
pub struct AnthropicService {
    config: ServiceConfig,
    transport: HttpTransport,
}

impl AnthropicService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        if config.api_key.trim().is_empty() {
            return Err(ServiceError::ConfigError(
                "Anthropic API key is required".to_string(),
            ));
        }
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

#[async_trait]
impl TextService for AnthropicService {
    fn name(&self) -> &str {
        "Anthropic Messages"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &ServicePrompt) -> Result<ServiceReply, ServiceError> {
        debug!(
            service = self.name(),
            model = %self.config.model,
            prompt_len = prompt.user.len(),
            "Calling service"
        );

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: &prompt.system,
            messages: vec![Message {
                role: "user",
                content: &prompt.user,
            }],
        };

        let headers = [
            ("x-api-key", self.config.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
        ];

        let (response, duration): (MessagesResponse, _) = self
            .transport
            .post_json(&self.config.api_url, &headers, &request)
            .await?;

        let text = extract_text(response)?;
        Ok(ServiceReply::new(text, duration))
    }
}

fn extract_text(response: MessagesResponse) -> Result<String, ServiceError> {
    let blocks: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if blocks.is_empty() {
        return Err(ServiceError::MalformedEnvelope(
            "Anthropic response contained no text blocks".to_string(),
        ));
    }

    Ok(blocks.join(""))
}
