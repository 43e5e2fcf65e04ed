use std::sync::Arc;

use super::ai_service::{VisionBackend, VisionRequest};
use super::image_prep;
use super::prompts::{food_analysis_user_prompt, FOOD_ANALYSIS_SYSTEM_PROMPT};
use super::response_adapter;
use crate::error::AnalysisError;
use crate::models::{AnalysisEnvelope, LegacyAnalysisResult};

const MAX_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct ModelPair {
    pub primary: String,
    /// More expensive, used only after the primary fails with a retryable error.
    pub fallback: String,
}

/// Retry state. Each retryable failure moves one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    Fallback,
    Exhausted,
}

impl Attempt {
    fn start(use_fallback: bool) -> Self {
        if use_fallback {
            Attempt::Fallback
        } else {
            Attempt::Primary
        }
    }

    fn next(self) -> Self {
        match self {
            Attempt::Primary => Attempt::Fallback,
            Attempt::Fallback | Attempt::Exhausted => Attempt::Exhausted,
        }
    }

    fn model(self, models: &ModelPair) -> Option<&str> {
        match self {
            Attempt::Primary => Some(&models.primary),
            Attempt::Fallback => Some(&models.fallback),
            Attempt::Exhausted => None,
        }
    }
}

/// Food photo analysis: preconditions the image, asks the vision model and
/// parses its JSON reply.
pub struct FoodAnalyzer {
    backend: Option<Arc<dyn VisionBackend>>,
    models: ModelPair,
    max_image_dimension: u32,
}

impl FoodAnalyzer {
    /// `backend` is None when no API credential is configured.
    pub fn new(
        backend: Option<Arc<dyn VisionBackend>>,
        models: ModelPair,
        max_image_dimension: u32,
    ) -> Self {
        Self {
            backend,
            models,
            max_image_dimension,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn analyze_legacy(
        &self,
        image_base64: String,
        locale: &str,
    ) -> Result<LegacyAnalysisResult, AnalysisError> {
        let envelope = self.analyze(image_base64, locale, false).await?;
        Ok(response_adapter::to_legacy(&envelope))
    }

    pub async fn analyze_v2(
        &self,
        image_base64: String,
        locale: &str,
    ) -> Result<AnalysisEnvelope, AnalysisError> {
        let envelope = self.analyze(image_base64, locale, false).await?;
        Ok(response_adapter::to_v2(envelope))
    }

    pub async fn analyze(
        &self,
        image_base64: String,
        locale: &str,
        use_fallback: bool,
    ) -> Result<AnalysisEnvelope, AnalysisError> {
        let backend = self.backend.as_ref().ok_or(AnalysisError::Configuration)?;

        log::info!(
            "📸 Starting food analysis (locale: {}, image: {} bytes)",
            locale,
            image_base64.len()
        );

        let max_dimension = self.max_image_dimension;
        let prepared = tokio::task::spawn_blocking(move || {
            image_prep::precondition(&image_base64, max_dimension)
        })
        .await
        .map_err(|e| AnalysisError::Failure(format!("image preparation task failed: {}", e)))?;
        let image_data_url = image_prep::to_data_url(&prepared);

        let user_prompt = food_analysis_user_prompt(locale);
        let mut attempt = Attempt::start(use_fallback);
        let mut last_error = None;

        while let Some(model) = attempt.model(&self.models) {
            let request = VisionRequest {
                model: model.to_string(),
                system_prompt: FOOD_ANALYSIS_SYSTEM_PROMPT.to_string(),
                user_prompt: user_prompt.clone(),
                image_data_url: image_data_url.clone(),
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            };

            match backend.complete(&request).await {
                Ok(content) => {
                    let envelope = parse_envelope(&content)?;
                    log::info!(
                        "✅ Food analysis complete. Model: {}, items found: {}",
                        model,
                        envelope.items.len()
                    );
                    return Ok(envelope);
                }
                Err(e) if e.is_retryable() => {
                    log::error!("❌ Vision call with {} failed: {}", model, e);
                    attempt = attempt.next();
                    if attempt != Attempt::Exhausted {
                        log::info!("🔁 Retrying with fallback model...");
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    log::error!("❌ Unexpected error in vision analysis: {}", e);
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AnalysisError::Failure("no attempts were made".to_string())))
    }
}

/// Strict parse of the model's reply; malformed JSON is never retried.
pub fn parse_envelope(content: &str) -> Result<AnalysisEnvelope, AnalysisError> {
    let envelope: AnalysisEnvelope = serde_json::from_str(content).map_err(|e| {
        let preview: String = content.chars().take(200).collect();
        log::error!("❌ JSON parse error: {}, content: {}", e, preview);
        AnalysisError::Parse(e.to_string())
    })?;

    envelope.validate().map_err(|reason| {
        log::error!("❌ Envelope validation failed: {}", reason);
        AnalysisError::Parse(reason)
    })?;

    Ok(envelope)
}
