//! Collection agent management.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use smartcollect::state::{Dca, NewDca};

use super::{ApiError, AppState, require_admin};

/// GET /api/dcas
pub async fn list(State(app): State<AppState>) -> Result<Json<Vec<Dca>>, ApiError> {
    let state = app.lock();
    require_admin(&state)?;
    Ok(Json(state.dcas().to_vec()))
}

/// POST /api/dcas — Add an agent. 201, or 409 if the username is taken.
pub async fn create(
    State(app): State<AppState>,
    Json(body): Json<NewDca>,
) -> Result<(StatusCode, Json<Dca>), ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    let dca = state.add_dca(body)?;
    Ok((StatusCode::CREATED, Json(dca)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalResponse {
    pub removed: Dca,
    pub unassigned_cases: usize,
    pub removed_entries: usize,
}

/// DELETE /api/dcas/{id} — Remove an agent, unassigning its cases and
/// deleting its schedule entries.
pub async fn remove(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovalResponse>, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    let removed = state.remove_dca(&id)?;
    Ok(Json(RemovalResponse {
        removed: removed.dca,
        unassigned_cases: removed.unassigned_cases,
        removed_entries: removed.removed_entries,
    }))
}
