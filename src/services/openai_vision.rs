use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ai_service::{VisionBackend, VisionRequest};
use crate::error::AnalysisError;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageData },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiVisionService {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiVisionService {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl VisionBackend for OpenAiVisionService {
    async fn complete(&self, request: &VisionRequest) -> Result<String, AnalysisError> {
        let body = build_chat_request(request);

        log::info!("🤖 Sending vision request with model: {}", request.model);
        log::debug!("📤 Image data URL size: {} bytes", request.image_data_url.len());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Vision request failed: {}", e);
                AnalysisError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        log::debug!("📥 Vision API response status: {}", status);

        let response_text = response
            .text()
            .await
            .map_err(|e| AnalysisError::UpstreamUnavailable(e.to_string()))?;

        if !status.is_success() {
            log::error!("❌ Vision API error ({}): {}", status, truncate(&response_text, 500));
            return Err(classify_error(status, &response_text));
        }

        extract_content(&response_text)
    }
}

fn build_chat_request(request: &VisionRequest) -> ChatRequest {
    ChatRequest {
        model: request.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(request.system_prompt.clone()),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: request.user_prompt.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageData {
                            url: request.image_data_url.clone(),
                            detail: "high",
                        },
                    },
                ]),
            },
        ],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        response_format: ResponseFormat {
            format_type: "json_object",
        },
    }
}

/// Maps a non-2xx reply to the analysis error taxonomy.
fn classify_error(status: reqwest::StatusCode, body: &str) -> AnalysisError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => format!(
            "{} ({}): {}",
            status,
            parsed.error.error_type.as_deref().unwrap_or("unknown"),
            parsed.error.message
        ),
        Err(_) => format!("{}: {}", status, truncate(body, 200)),
    };

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        AnalysisError::RateLimited(message)
    } else {
        AnalysisError::UpstreamUnavailable(message)
    }
}

fn extract_content(response_text: &str) -> Result<String, AnalysisError> {
    let chat_response: ChatResponse = serde_json::from_str(response_text).map_err(|e| {
        AnalysisError::UpstreamUnavailable(format!("unexpected completion body: {}", e))
    })?;

    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AnalysisError::Failure("model returned no content".to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
