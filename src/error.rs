use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a food analysis request.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("OpenAI API key not configured (set OPENAI_KEY or OPENAI_API_KEY)")]
    Configuration,

    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("failed to parse analysis results: {0}")]
    Parse(String),

    #[error("analysis failed: {0}")]
    Failure(String),
}

impl AnalysisError {
    /// Errors worth one more attempt against the fallback model.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::RateLimited(_) | AnalysisError::UpstreamUnavailable(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Parse(_) | AnalysisError::Failure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to API callers. Upstream details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            AnalysisError::Configuration => self.to_string(),
            AnalysisError::RateLimited(_) => {
                "API rate limit exceeded. Please try again later.".to_string()
            }
            AnalysisError::UpstreamUnavailable(_) => {
                "Food analysis service temporarily unavailable".to_string()
            }
            AnalysisError::Parse(_) => "Failed to parse analysis results".to_string(),
            AnalysisError::Failure(message) => format!("Analysis failed: {}", message),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
