mod handlers;
mod routes;

use anyhow::{Context, Result};
use assessor_common::config::JudgeConfig;
use assessor_judge::questions::DEFAULT_QUESTIONS_PATH;
use assessor_judge::{CaseRunner, JudgeClient, QuestionBank, QuestionSource, ResultCache};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub runner: Arc<CaseRunner>,
    pub questions: Arc<dyn QuestionSource>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // LOG_FORMAT=json for log shippers, human-readable otherwise
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Assessor API booting...");

    let config = JudgeConfig::load_default()?;
    config.validate()?;
    info!(
        api_url = %config.api_url,
        language_id = config.language_id,
        cache_ttl_secs = config.cache_ttl_secs,
        "Judge configuration loaded"
    );

    let questions_path = std::env::var("QUESTIONS_PATH")
        .unwrap_or_else(|_| DEFAULT_QUESTIONS_PATH.to_string());
    let questions = QuestionBank::load_from_file(&questions_path)?;
    info!("Loaded {} questions from {}", questions.len(), questions_path);

    let cache = Arc::new(ResultCache::new(config.cache_ttl()));
    let sweeper = cache.spawn_sweeper(config.cache_sweep_interval());

    let client = Arc::new(JudgeClient::new(config)?);
    let runner = Arc::new(CaseRunner::with_fallback(cache, client));

    let state = Arc::new(AppState {
        runner,
        questions: Arc::new(questions),
    });

    // Build router
    let app = Router::new()
        .merge(routes::routes())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.stop().await;
    info!("Assessor API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
