use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::AnalysisError;
use crate::models::{AnalysisEnvelope, AnalyzeFoodRequest, LegacyAnalysisResult};
use crate::services::FoodAnalyzer;

pub struct AppState {
    pub analyzer: Arc<FoodAnalyzer>,
}

pub fn create_api_router(analyzer: Arc<FoodAnalyzer>, max_request_bytes: usize) -> Router {
    let state = Arc::new(AppState { analyzer });

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/food/analyze", post(analyze_food))
        .route("/api/food/analyze/v2", post(analyze_food_v2))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Legacy endpoint: flat items list with totals summed server-side.
async fn analyze_food(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeFoodRequest>,
) -> Result<Json<LegacyAnalysisResult>, AnalysisError> {
    log::info!("🍽️ POST /api/food/analyze (locale: {})", request.locale);

    let result = state
        .analyzer
        .analyze_legacy(request.image_base64, &request.locale)
        .await
        .map_err(|e| {
            log::error!("❌ Food analyze error: {}", e);
            e
        })?;

    Ok(Json(result))
}

async fn analyze_food_v2(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeFoodRequest>,
) -> Result<Json<AnalysisEnvelope>, AnalysisError> {
    log::info!("🍽️ POST /api/food/analyze/v2 (locale: {})", request.locale);

    let envelope = state
        .analyzer
        .analyze_v2(request.image_base64, &request.locale)
        .await
        .map_err(|e| {
            log::error!("❌ Food analyze v2 error: {}", e);
            e
        })?;

    Ok(Json(envelope))
}

async fn root_handler() -> &'static str {
    "Food Vision Service - POST /api/food/analyze or /api/food/analyze/v2"
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "vision_configured": state.analyzer.is_configured(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_service::VisionRequest;
    use crate::services::{ModelPair, VisionBackend};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    const REPLY: &str = r#"{
        "items": [{
            "name": "Lahmacun",
            "quantity_estimate": {"grams": 180, "range_grams": [150, 210]},
            "calories_kcal": 420,
            "macros": {"protein_g": 17.2, "carbs_g": 55.0, "fat_g": 14.1},
            "confidence": 0.65
        }],
        "total": {"calories_kcal": 400, "protein_g": 17.2, "carbs_g": 55.0, "fat_g": 14.1},
        "questions": ["Yanında ayran var mı?"],
        "notes": "Limon sıkılmış"
    }"#;

    /// Always answers with the same result.
    struct FixedBackend(fn() -> Result<String, AnalysisError>);

    #[async_trait::async_trait]
    impl VisionBackend for FixedBackend {
        async fn complete(&self, _request: &VisionRequest) -> Result<String, AnalysisError> {
            (self.0)()
        }
    }

    fn router_with(backend: Option<Arc<dyn VisionBackend>>) -> Router {
        let analyzer = FoodAnalyzer::new(
            backend,
            ModelPair {
                primary: "gpt-4o-mini".to_string(),
                fallback: "gpt-4o".to_string(),
            },
            1280,
        );
        create_api_router(Arc::new(analyzer), 1024 * 1024)
    }

    fn ok_backend() -> Option<Arc<dyn VisionBackend>> {
        Some(Arc::new(FixedBackend(|| Ok(REPLY.to_string()))))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router_with(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["vision_configured"], false);
    }

    #[tokio::test]
    async fn test_legacy_endpoint() {
        let response = router_with(ok_backend())
            .oneshot(post_json("/api/food/analyze", json!({ "image_base64": "aW1n" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_calories"], 420);
        assert_eq!(body["needs_user_confirmation"], true);
        assert_eq!(body["notes"], json!(["Limon sıkılmış", "Yanında ayran var mı?"]));
        assert_eq!(body["items"][0]["label"], "Lahmacun");
        assert_eq!(body["items"][0]["portion"]["estimate_g"], 180);
        assert!(body["items"][0]["food_id"].is_null());
    }

    #[tokio::test]
    async fn test_v2_endpoint_passes_envelope_through() {
        let response = router_with(ok_backend())
            .oneshot(post_json(
                "/api/food/analyze/v2",
                json!({ "image_base64": "aW1n", "locale": "en-US" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        // model's own total is kept as-is in v2
        assert_eq!(body["total"]["calories_kcal"], 400.0);
        assert_eq!(body["items"][0]["quantity_estimate"]["range_grams"], json!([150, 210]));
        assert_eq!(body["questions"][0], "Yanında ayran var mı?");
    }

    #[tokio::test]
    async fn test_missing_credential_is_503() {
        let response = router_with(None)
            .oneshot(post_json("/api/food/analyze", json!({ "image_base64": "aW1n" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("OPENAI_KEY"));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let cases: [(fn() -> Result<String, AnalysisError>, StatusCode); 4] = [
            (|| Err(AnalysisError::RateLimited("429".into())), StatusCode::TOO_MANY_REQUESTS),
            (|| Err(AnalysisError::UpstreamUnavailable("503".into())), StatusCode::BAD_GATEWAY),
            (|| Ok("not json".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (|| Err(AnalysisError::Failure("boom".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (reply, expected) in cases {
            let backend: Arc<dyn VisionBackend> = Arc::new(FixedBackend(reply));
            let response = router_with(Some(backend))
                .oneshot(post_json("/api/food/analyze/v2", json!({ "image_base64": "aW1n" })))
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_missing_image_field_rejected() {
        let response = router_with(ok_backend())
            .oneshot(post_json("/api/food/analyze", json!({ "locale": "tr-TR" })))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
