//! REST console for smartcollect.
//!
//! `smartcollect-web` exposes the admin console, the agent console and the
//! three AI helpers over an axum server. All handlers share one
//! [`CollectionState`] behind `Arc<Mutex<_>>` and one [`ChatBackend`].
//!
//! # Quick start
//!
//! ```ignore
//! use smartcollect::backend::ScriptedBackend;
//! use smartcollect::state::CollectionState;
//! use smartcollect_web::{WebConfig, spawn_web};
//! use std::sync::{Arc, Mutex};
//!
//! let state = Arc::new(Mutex::new(CollectionState::seeded()));
//! let backend = Arc::new(ScriptedBackend::offline());
//! let addr = spawn_web(state, backend, WebConfig::default()).await?;
//! println!("Console API: http://{addr}/api");
//! ```
//!
//! # Architecture
//!
//! ```text
//! HTTP ──▶ handler ──lock──▶ CollectionState ──unlock──▶ TaskRunner ──▶ ChatBackend
//!                                   ▲                                      │
//!                                   └──── lock, check dialog token ◀──────┘
//! ```

mod api;
mod server;

pub use api::{ApiError, AppState};
pub use server::build_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use smartcollect::backend::ChatBackend;
use smartcollect::state::CollectionState;
use smartcollect::tasks::TaskConfig;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory with the console's static build.
    ///
    /// If `None`, only API endpoints are served and the console runs
    /// separately.
    pub static_dir: Option<PathBuf>,
    /// Model settings for the AI helpers.
    pub tasks: TaskConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
            tasks: TaskConfig::default(),
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(
    state: Arc<Mutex<CollectionState>>,
    backend: Arc<dyn ChatBackend>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let app = AppState::new(state, backend, config.tasks);
    let router = server::build_router(app, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
