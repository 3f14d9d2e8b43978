//! The timetable of agent tasks.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use smartcollect::state::{NewScheduleEntry, ScheduleEntry, ScheduleUpdate};

use super::{ApiError, AppState, require_admin};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleParams {
    /// Only entries on this day, ordered by time.
    pub date: Option<NaiveDate>,
    /// Only entries for this agent.
    pub dca_id: Option<String>,
}

/// GET /api/schedule?date=YYYY-MM-DD&dcaId=...
pub async fn list(
    State(app): State<AppState>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError> {
    let state = app.lock();
    require_admin(&state)?;
    let mut entries: Vec<ScheduleEntry> = match params.date {
        Some(date) => state.schedule_for_date(date).into_iter().cloned().collect(),
        None => state.schedule().to_vec(),
    };
    if let Some(ref dca_id) = params.dca_id {
        entries.retain(|e| &e.dca_id == dca_id);
    }
    Ok(Json(entries))
}

/// POST /api/schedule — 201 with the new entry.
pub async fn create(
    State(app): State<AppState>,
    Json(body): Json<NewScheduleEntry>,
) -> Result<(StatusCode, Json<ScheduleEntry>), ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    let entry = state.add_schedule_entry(body)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/schedule/{id}
pub async fn update(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ScheduleUpdate>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    Ok(Json(state.update_schedule_entry(&id, body)?))
}

/// DELETE /api/schedule/{id} — 204.
pub async fn remove(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    state.remove_schedule_entry(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
