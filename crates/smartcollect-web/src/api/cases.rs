//! Case management for the admin console, plus agent feedback.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use smartcollect::state::{Case, CaseUpdate, CommunicationChannel, NewCase, NoticeVariant};

use super::{ApiError, AppState, require_admin, require_agent};

/// Which slice of the case list to return.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseView {
    #[default]
    All,
    /// No agent feedback yet.
    Unresolved,
    /// Agent feedback on an open case.
    Responded,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ListParams {
    pub view: CaseView,
}

/// GET /api/cases?view=all|unresolved|responded
pub async fn list(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Case>>, ApiError> {
    let state = app.lock();
    require_admin(&state)?;
    let cases = match params.view {
        CaseView::All => state.cases().to_vec(),
        CaseView::Unresolved => state.unresolved_cases().into_iter().cloned().collect(),
        CaseView::Responded => state.responded_cases().into_iter().cloned().collect(),
    };
    Ok(Json(cases))
}

/// POST /api/cases — Open a case. 201 with the new record.
pub async fn create(
    State(app): State<AppState>,
    Json(body): Json<NewCase>,
) -> Result<(StatusCode, Json<Case>), ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    let case = state.add_case(body)?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /api/cases/{id}
pub async fn get(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Case>, ApiError> {
    let state = app.lock();
    require_admin(&state)?;
    state
        .case(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))
}

/// PATCH /api/cases/{id} — Partial update; absent fields are left alone.
pub async fn update(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CaseUpdate>,
) -> Result<Json<Case>, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    let case = state.update_case(&id, body)?;
    state.notify(
        NoticeVariant::Default,
        "Case Updated",
        format!("Case {} has been updated.", case.invoice_no),
    );
    Ok(Json(case))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub dca_id: String,
}

/// POST /api/cases/{id}/assign
pub async fn assign(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Case>, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    Ok(Json(state.assign_case(&id, &body.dca_id)?))
}

/// POST /api/cases/{id}/paid
pub async fn mark_paid(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Case>, ApiError> {
    let mut state = app.lock();
    require_admin(&state)?;
    Ok(Json(state.mark_paid(&id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: String,
    pub response_mode: CommunicationChannel,
}

/// POST /api/cases/{id}/feedback — The logged-in agent reports on one of
/// their cases.
pub async fn feedback(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<Case>, ApiError> {
    let mut state = app.lock();
    let agent = require_agent(&state)?;
    let case = state.submit_feedback(&id, &agent, &body.feedback, body.response_mode)?;
    Ok(Json(case))
}
