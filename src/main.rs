mod api;
mod config;
mod error;
mod models;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use api::create_api_router;
use config::AppConfig;
use services::{FoodAnalyzer, ModelPair, OpenAiVisionService, VisionBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger (RUST_LOG, info by default)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting Food Vision Service...");

    let cfg = AppConfig::from_env()?;

    let backend: Option<Arc<dyn VisionBackend>> = match cfg.openai_api_key.clone() {
        Some(api_key) => {
            let service = OpenAiVisionService::new(
                api_key,
                cfg.openai_base_url.clone(),
                cfg.request_timeout,
            )?;
            log::info!(
                "✅ Vision service initialized ({}), models: {} / fallback {}",
                cfg.openai_base_url,
                cfg.primary_model,
                cfg.fallback_model
            );
            Some(Arc::new(service) as Arc<dyn VisionBackend>)
        }
        None => {
            log::warn!("⚠️ OPENAI_KEY / OPENAI_API_KEY not set, food analysis will answer 503");
            None
        }
    };

    let analyzer = Arc::new(FoodAnalyzer::new(
        backend,
        ModelPair {
            primary: cfg.primary_model.clone(),
            fallback: cfg.fallback_model.clone(),
        },
        cfg.max_image_dimension,
    ));

    let app = create_api_router(analyzer, cfg.max_request_bytes);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("🌐 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("❌ Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("❌ Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("🛑 Shutdown signal received, stopping server...");
}
