//! Binary entry point: loads configuration, wires the LLM adapter and
//! storage backend together, and serves the HTTP/SSE surface until
//! ctrl-c (spec §6).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use storyengine_domain::Scenario;
use storyengine_engine::config::AppConfig;
use storyengine_engine::llm::OpenAiCompatAdapter;
use storyengine_engine::storage::InMemoryStorage;
use storyengine_engine::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let adapter = OpenAiCompatAdapter::new(
        config.llm.base_url.clone(),
        config.llm.api_key.clone(),
        config.llm.primary_model.clone(),
        config.llm.backend_model.clone(),
        config.llm.narration_timeout,
    )
    .context("failed to build LLM adapter")?;

    let mut storage = InMemoryStorage::new();
    if let Ok(dir) = std::env::var("SCENARIO_DIR") {
        for scenario in load_scenarios_from_dir(Path::new(&dir))? {
            storage = storage.with_scenario(scenario);
        }
    }

    let port = config.server_port;
    let state = Arc::new(AppState::new(config, Arc::new(storage), Arc::new(adapter)));
    let app = storyengine_engine::http::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!(port, "story engine listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}

/// Reads every `*.json` file in `dir` as one `Scenario` (spec §6 on-disk
/// format), validating each before it's accepted into the catalog.
fn load_scenarios_from_dir(dir: &Path) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read scenario directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("{} failed validation", path.display()))?;
        tracing::info!(scenario = %scenario.name, path = %path.display(), "loaded scenario");
        scenarios.push(scenario);
    }

    Ok(scenarios)
}
