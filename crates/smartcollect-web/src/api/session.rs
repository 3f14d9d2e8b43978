//! Login, logout and the agent console.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use smartcollect::auth::{LoginOutcome, SessionUser};
use smartcollect::state::{Case, ScheduleEntry};

use super::{ApiError, AppState, require_agent};

/// Request body for POST /api/login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub role: &'static str,
    pub user: SessionUser,
}

/// POST /api/login — Authenticate and start a session.
///
/// 401 for a wrong password, 404 for an unknown username.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut state = app.lock();
    let role = match state.login(&body.username, &body.password) {
        LoginOutcome::Admin => "Admin",
        LoginOutcome::Agent(_) => "DCA",
        LoginOutcome::InvalidPassword => {
            return Err(ApiError::Unauthorized("Invalid password".into()));
        }
        LoginOutcome::NotFound => return Err(ApiError::NotFound("User not found".into())),
    };
    let user = state
        .session()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".into()))?;
    Ok(Json(LoginResponse { role, user }))
}

/// POST /api/logout — End the session. Always 204.
pub async fn logout(State(app): State<AppState>) -> StatusCode {
    app.lock().logout();
    StatusCode::NO_CONTENT
}

/// GET /api/session — The logged-in user, or 204 when nobody is.
pub async fn current(State(app): State<AppState>) -> Response {
    match app.lock().session().cloned() {
        Some(user) => Json(user).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /api/agent/cases — Open cases assigned to the logged-in agent.
pub async fn agent_cases(State(app): State<AppState>) -> Result<Json<Vec<Case>>, ApiError> {
    let state = app.lock();
    let agent = require_agent(&state)?;
    Ok(Json(
        state.cases_for_dca(&agent).into_iter().cloned().collect(),
    ))
}

/// GET /api/agent/schedule — The logged-in agent's schedule.
pub async fn agent_schedule(
    State(app): State<AppState>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError> {
    let state = app.lock();
    let agent = require_agent(&state)?;
    Ok(Json(
        state.schedule_for_dca(&agent).into_iter().cloned().collect(),
    ))
}
