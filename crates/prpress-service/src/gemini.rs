use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{HttpTransport, ServiceConfig, ServiceError, ServicePrompt, ServiceReply, TextService};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Google Generative Language `generateContent` adapter
#[derive(Clone)]
pub struct GeminiService {
    config: ServiceConfig,
    transport: HttpTransport,
}

impl GeminiService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        if config.api_key.trim().is_empty() {
            return Err(ServiceError::ConfigError(
                "Gemini API key is required".to_string(),
            ));
        }
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// URL format: {base_url}/models/{model}:generateContent
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextService for GeminiService {
    fn name(&self) -> &str {
        "Gemini"
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

        let system_instruction = (!prompt.system.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: &prompt.system,
            }],
        });

        let request = GenerateRequest {
            system_instruction,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_tokens,
                response_mime_type: self.config.json_response.then_some("application/json"),
            },
        };

        let headers = [("x-goog-api-key", self.config.api_key.as_str())];

        let (response, duration): (GenerateResponse, _) = self
            .transport
            .post_json(&self.endpoint(), &headers, &request)
            .await?;

        let text = extract_text(response)?;
        Ok(ServiceReply::new(text, duration))
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ServiceError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ServiceError::MalformedEnvelope(
            "Gemini response contained no candidate text".to_string(),
        ));
    }

    Ok(text)
}
