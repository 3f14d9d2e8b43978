//! Dashboard aggregates and the notice feed.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use smartcollect::state::{DashboardSummary, Notice};

use super::{ApiError, AppState, require_admin, require_session};

/// GET /api/dashboard — Admin dashboard figures, recomputed per request.
pub async fn dashboard(State(app): State<AppState>) -> Result<Json<DashboardSummary>, ApiError> {
    let state = app.lock();
    require_admin(&state)?;
    Ok(Json(state.dashboard()))
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct NoticeParams {
    /// Only notices with a higher sequence number.
    pub since: u64,
}

/// GET /api/notices?since=N — Notices newer than `since`, oldest first.
pub async fn notices(
    State(app): State<AppState>,
    Query(params): Query<NoticeParams>,
) -> Result<Json<Vec<Notice>>, ApiError> {
    let state = app.lock();
    require_session(&state)?;
    Ok(Json(state.notices().since(params.since)))
}
