//! AIDE server - main entry point.
//!
//! Serves the conversational requirement-gathering and code-generation
//! pipeline over a WebSocket endpoint at `/ws`.

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aide_builder::ProjectBuilder;
use aide_chat::{CompletionConfig, OllamaClient, Orchestrator};
use aide_store::ProjectStore;

use aide_server::ws::{ws_handler, AppState};

/// WebSocket session server for AIDE.
#[derive(Parser, Debug)]
#[command(name = "aide-server", version, about)]
struct Args {
    /// Port the WebSocket server listens on.
    #[arg(long, default_value_t = 8765, env = "AIDE_PORT")]
    port: u16,

    /// Directory holding project documents and generated trees.
    #[arg(long, default_value = "projects", env = "AIDE_DATA_DIR")]
    data_dir: String,

    /// Base URL of the Ollama completion service.
    #[arg(long, default_value = "http://localhost:11434", env = "AIDE_OLLAMA_URL")]
    ollama_url: String,

    /// Model used for all completion calls.
    #[arg(long, default_value = "llama3.2:1b", env = "AIDE_MODEL")]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("aide=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();
    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let args = Args::parse();

    let store = ProjectStore::new(&args.data_dir)
        .with_context(|| format!("Failed to open data directory {}", args.data_dir))?;

    let completion = Arc::new(
        OllamaClient::new(CompletionConfig {
            base_url: args.ollama_url,
            model: args.model,
            ..CompletionConfig::default()
        })
        .context("Failed to build completion client")?,
    );

    let state = Arc::new(AppState {
        store: store.clone(),
        orchestrator: Orchestrator::new(store.clone(), completion.clone()),
        builder: ProjectBuilder::new(store, completion),
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("AIDE server running on ws://{}/ws", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
