//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::api::{AppState, assist, cases, console, dcas, schedule, session};

/// Build the full axum router.
///
/// The router serves the REST API at `/api/*` and, when `static_dir` is set,
/// the console's static build for every other path.
pub fn build_router(app: AppState, static_dir: Option<PathBuf>) -> Router {
    // CORS layer for development (console dev server on a different port).
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // ── Session ──
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route("/api/session", get(session::current))
        // ── Admin console ──
        .route("/api/dashboard", get(console::dashboard))
        .route("/api/cases", get(cases::list).post(cases::create))
        .route("/api/cases/{id}", get(cases::get).patch(cases::update))
        .route("/api/cases/{id}/assign", post(cases::assign))
        .route("/api/cases/{id}/paid", post(cases::mark_paid))
        .route("/api/cases/{id}/prioritize", post(assist::prioritize))
        .route("/api/dcas", get(dcas::list).post(dcas::create))
        .route("/api/dcas/{id}", delete(dcas::remove))
        .route("/api/dcas/{id}/analyze", post(assist::analyze))
        .route("/api/schedule", get(schedule::list).post(schedule::create))
        .route(
            "/api/schedule/{id}",
            patch(schedule::update).delete(schedule::remove),
        )
        // ── Agent console ──
        .route("/api/agent/cases", get(session::agent_cases))
        .route("/api/agent/schedule", get(session::agent_schedule))
        .route("/api/cases/{id}/feedback", post(cases::feedback))
        .route("/api/cases/{id}/suggest-channel", post(assist::suggest_channel))
        // ── Shared ──
        .route("/api/dialogs/{id}", delete(assist::close_dialog))
        .route("/api/notices", get(console::notices))
        .with_state(app);

    let mut router = Router::new().merge(api_routes).layer(cors);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Bind `bind_addr`, spawn the server on a Tokio task and return the bound
/// address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("server stopped: {e}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use smartcollect::backend::ScriptedBackend;
    use smartcollect::state::CollectionState;
    use smartcollect::tasks::TaskConfig;

    #[test]
    fn router_builds_with_and_without_static_dir() {
        let app = AppState::new(
            Arc::new(Mutex::new(CollectionState::new())),
            Arc::new(ScriptedBackend::new()),
            TaskConfig::default(),
        );
        let _ = build_router(app.clone(), None);
        let _ = build_router(app, Some(PathBuf::from("public")));
    }
}
