//! tunesmith-ai - Song metadata generation service
//!
//! Serves title/lyrics/style/tempo/key/time-signature generation over HTTP for
//! the Tunesmith web UI. Without a Gemini API key the service runs in mock mode.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tunesmith_ai::models::ModelId;
use tunesmith_ai::services::{GeminiClient, GenerationBackend, GeneratorConfig, MetadataGenerator};
use tunesmith_ai::AppState;
use tunesmith_common::config::{default_config_path, load_toml_config, resolve_api_key};
use tunesmith_common::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "tunesmith-ai", version, about = "Song metadata generation service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "TUNESMITH_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long, env = "TUNESMITH_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(default_config_path);
    let config = load_toml_config(&config_path)?;

    init_tracing(&config.logging);

    info!(
        "Starting tunesmith-ai v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Configuration: {}", config_path.display());

    let default_model = config
        .default_model
        .as_deref()
        .map(str::parse::<ModelId>)
        .transpose()?
        .unwrap_or_default();

    // Credential is resolved once; the client is built once and shared.
    let backend: Option<Arc<dyn GenerationBackend>> = match resolve_api_key(&config) {
        Some(key) => Some(Arc::new(GeminiClient::new(key, &config.gemini_base_url)?)),
        None => {
            warn!("Mock mode: generation requests return canned metadata");
            None
        }
    };

    let generator = MetadataGenerator::new(backend, GeneratorConfig::from(&config));
    let state = AppState::new(generator)
        .with_default_model(default_model)
        .with_max_retries(config.max_retries);
    let app = tunesmith_ai::build_router(state);

    let port = args.port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Default model: {} ({})", default_model, default_model.display_name());

    axum::serve(listener, app).await?;

    Ok(())
}
