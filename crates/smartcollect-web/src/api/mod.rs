//! REST API endpoint handlers.
//!
//! Handlers lock the shared [`CollectionState`] only for the synchronous part
//! of their work. AI helpers build their task input under the lock, release
//! it for the model call, and lock again to apply the result.

pub mod assist;
pub mod cases;
pub mod console;
pub mod dcas;
pub mod schedule;
pub mod session;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use smartcollect::auth::SessionUser;
use smartcollect::backend::ChatBackend;
use smartcollect::dialog::DialogRegistry;
use smartcollect::state::{CollectionState, StateError};
use smartcollect::tasks::{TaskConfig, TaskError, TaskRunner};

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<Mutex<CollectionState>>,
    pub backend: Arc<dyn ChatBackend>,
    pub tasks: TaskConfig,
    pub dialogs: Arc<DialogRegistry>,
}

impl AppState {
    pub fn new(
        state: Arc<Mutex<CollectionState>>,
        backend: Arc<dyn ChatBackend>,
        tasks: TaskConfig,
    ) -> Self {
        Self {
            state,
            backend,
            tasks,
            dialogs: Arc::new(DialogRegistry::new()),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn runner(&self) -> TaskRunner<'_> {
        TaskRunner::new(self.backend.as_ref(), self.tasks.clone())
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// An error answered as `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// The AI call was cancelled; its result was discarded.
    Cancelled,
    /// The AI call failed. The cause is only logged.
    Upstream,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Cancelled => StatusCode::CONFLICT,
            ApiError::Upstream => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m) => m,
            ApiError::Cancelled => "The request was cancelled.",
            ApiError::Upstream => TaskError::USER_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        let message = e.to_string();
        match e {
            StateError::CaseNotFound(_)
            | StateError::DcaNotFound(_)
            | StateError::EntryNotFound(_) => ApiError::NotFound(message),
            StateError::UsernameTaken(_) => ApiError::Conflict(message),
            StateError::NotAssigned { .. } => ApiError::Forbidden(message),
            StateError::NotLoggedIn => ApiError::Unauthorized(message),
            StateError::Invalid(_) => ApiError::BadRequest(message),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        if e.is_cancelled() {
            ApiError::Cancelled
        } else {
            ApiError::Upstream
        }
    }
}

// ── Session guards ─────────────────────────────────────────────────

/// The admin console requires an admin session.
pub(crate) fn require_admin(state: &CollectionState) -> Result<(), ApiError> {
    match state.session() {
        Some(user) if user.is_admin() => Ok(()),
        Some(_) => Err(ApiError::Forbidden("Admin access required".into())),
        None => Err(ApiError::Unauthorized("Not logged in".into())),
    }
}

/// The logged-in agent's id.
pub(crate) fn require_agent(state: &CollectionState) -> Result<String, ApiError> {
    match state.session() {
        Some(SessionUser::Agent { id, .. }) => Ok(id.clone()),
        Some(_) => Err(ApiError::Forbidden("DCA access required".into())),
        None => Err(ApiError::Unauthorized("Not logged in".into())),
    }
}

pub(crate) fn require_session(state: &CollectionState) -> Result<SessionUser, ApiError> {
    state
        .session()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_map_to_status_codes() {
        let cases = [
            (StateError::CaseNotFound("c".into()), StatusCode::NOT_FOUND),
            (StateError::UsernameTaken("u".into()), StatusCode::CONFLICT),
            (StateError::NotLoggedIn, StatusCode::UNAUTHORIZED),
            (StateError::Invalid("x".into()), StatusCode::BAD_REQUEST),
            (
                StateError::NotAssigned {
                    case: "c".into(),
                    dca: "d".into(),
                },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn task_failures_hide_the_cause() {
        let err = ApiError::from(TaskError::MalformedReply("secret detail".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), TaskError::USER_MESSAGE);
        assert_eq!(
            ApiError::from(TaskError::Cancelled).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn guards_follow_the_session() {
        let mut state = CollectionState::seeded();
        assert!(matches!(
            require_admin(&state),
            Err(ApiError::Unauthorized(_))
        ));
        state.login("johndoe", "password123");
        assert!(matches!(require_admin(&state), Err(ApiError::Forbidden(_))));
        assert!(require_agent(&state).is_ok());
        state.login("admin.com", "admin@123");
        assert!(require_admin(&state).is_ok());
        assert!(matches!(require_agent(&state), Err(ApiError::Forbidden(_))));
    }
}
