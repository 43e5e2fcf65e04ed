use crate::error::AnalysisError;

/// One vision chat-completion call against a single model.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// `data:<mime>;base64,...`
    pub image_data_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for vision model providers (OpenAI, OpenRouter, local servers...)
///
/// Implementations make exactly one attempt and return the assistant's raw
/// text. Throttling must map to `RateLimited` and transport/HTTP failures to
/// `UpstreamUnavailable` so the caller can decide about the fallback model.
#[async_trait::async_trait]
pub trait VisionBackend: Send + Sync {
    async fn complete(&self, request: &VisionRequest) -> Result<String, AnalysisError>;
}
