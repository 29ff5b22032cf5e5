mod anthropic;
mod gemini;
mod reply;
mod traits;
mod transport;

pub use anthropic::AnthropicService;
pub use gemini::GeminiService;
pub use reply::{ServicePrompt, ServiceReply};
pub use traits::{ServiceConfig, ServiceError, ServiceKind, TextService};
pub use transport::HttpTransport;

use std::sync::Arc;

/// Create a service adapter by kind
pub fn create_service(
    kind: ServiceKind,
    config: ServiceConfig,
) -> Result<Arc<dyn TextService>, ServiceError> {
    match kind {
        ServiceKind::Anthropic => Ok(Arc::new(AnthropicService::new(config)?)),
        ServiceKind::Gemini => Ok(Arc::new(GeminiService::new(config)?)),
    }
}
