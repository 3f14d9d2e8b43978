//! smartcollect console server.
//!
//! Serves the admin and agent console API over the demo dataset. AI helpers
//! call OpenRouter with the key from `OPENROUTER_KEY`, or answer with canned
//! replies under `--offline`.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... cargo run -p smartcollect-web
//! OPENROUTER_KEY=sk-... cargo run -p smartcollect-web -- --model google/gemini-2.5-flash
//! cargo run -p smartcollect-web -- --offline --port 8080 --log-level debug
//! ```
//!
//! Then log in:
//!
//! ```bash
//! curl -X POST localhost:3001/api/login -H 'content-type: application/json' \
//!   -d '{"username":"admin.com","password":"admin@123"}'
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use smartcollect::auth::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use smartcollect::backend::{ChatBackend, ScriptedBackend};
use smartcollect::state::CollectionState;
use smartcollect::tasks::TaskConfig;
use smartcollect::{DEFAULT_MODEL, OpenRouterClient};
use smartcollect_web::{WebConfig, spawn_web};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// smartcollect console server.
#[derive(Parser)]
#[command(about = "Debt-collection console API with AI helpers")]
struct Args {
    /// Model for the AI helpers.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Admin login username.
    #[arg(long, default_value = DEFAULT_ADMIN_USERNAME)]
    admin_username: String,

    /// Admin login password.
    #[arg(long, default_value = DEFAULT_ADMIN_PASSWORD)]
    admin_password: String,

    /// Answer AI helpers with canned replies instead of calling the model.
    #[arg(long)]
    offline: bool,

    /// Directory with the console's static build to serve.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log verbosity (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(args.log_level)
        .init();

    // 1. Model backend.
    let backend: Arc<dyn ChatBackend> = if args.offline {
        info!("offline mode: AI helpers use canned replies");
        Arc::new(ScriptedBackend::offline())
    } else {
        let api_key = std::env::var("OPENROUTER_KEY")
            .map_err(|_| "Set OPENROUTER_KEY env var to your OpenRouter API key, or pass --offline")?;
        Arc::new(OpenRouterClient::new(api_key)?)
    };

    // 2. Shared state with the demo dataset.
    let state = CollectionState::seeded()
        .with_admin(&args.admin_username, &args.admin_password)
        .map_err(|e| format!("invalid admin account: {e}"))?;
    let state = Arc::new(Mutex::new(state));

    // 3. Serve.
    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
        tasks: TaskConfig::default().with_model(args.model),
    };
    let addr = spawn_web(state, backend, config)
        .await
        .map_err(|e| format!("failed to bind port {}: {e}", args.port))?;
    println!("Console API: http://{addr}/api");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("shutting down");
    Ok(())
}
