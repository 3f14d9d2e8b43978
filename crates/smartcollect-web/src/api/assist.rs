//! AI helper endpoints and dialog closing.
//!
//! Each helper is one prompt task run. When a `dialogId` query parameter is
//! given, the call is scoped to that dialog: a later call in the same dialog
//! or `DELETE /api/dialogs/{id}` cancels it, and a cancelled call answers 409
//! without touching state. Failures answer 502 with the generic message and
//! post a destructive notice; the cause only goes to the log.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use smartcollect::auth::SessionUser;
use smartcollect::dialog::DialogTicket;
use smartcollect::state::{Case, CollectionState, NoticeVariant};
use smartcollect::tasks::{
    AnalyzeDcaPerformance, ChannelInput, ChannelSuggestion, PerformanceAnalysis,
    PerformanceInput, PrioritizeCases, PriorityAssessment, PriorityInput, PromptTask,
    SuggestCommunicationMode,
};
use tracing::{info, warn};

use super::{ApiError, AppState, require_admin, require_session};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistParams {
    pub dialog_id: Option<String>,
}

/// Notice posted when a helper fails.
struct Failure {
    title: &'static str,
    description: &'static str,
}

const PRIORITIZE_FAILED: Failure = Failure {
    title: "AI Prioritization Failed",
    description: "Could not get priority score. Please try again.",
};
const ANALYZE_FAILED: Failure = Failure {
    title: "AI Analysis Failed",
    description: "Could not analyze DCA performance. Please try again.",
};
const SUGGEST_FAILED: Failure = Failure {
    title: "AI Suggestion Failed",
    description: "Could not get communication suggestion. Please try again.",
};

/// Run `T` without holding the state lock. On success the ticket stays open
/// in its dialog; hand it to [`settle`] to apply the output.
async fn run_in_dialog<T: PromptTask>(
    app: &AppState,
    input: T::Input,
    dialog_id: Option<&str>,
    failure: &Failure,
) -> Result<(T::Output, DialogTicket), ApiError> {
    let ticket = app.dialogs.begin(dialog_id);
    let result = app
        .runner()
        .run_until_cancelled::<T>(&input, ticket.token())
        .await;

    match result {
        Ok(output) => Ok((output, ticket)),
        Err(e) => {
            app.dialogs.finish(&ticket);
            if e.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            warn!("{} failed: {e}", T::NAME);
            app.lock()
                .notify(NoticeVariant::Destructive, failure.title, failure.description);
            Err(e.into())
        }
    }
}

/// Apply a finished call's output under the state lock, unless its dialog
/// was closed first. The ticket is only released afterwards, so a close
/// either lands before the check or finds nothing left to cancel.
fn settle<R>(
    app: &AppState,
    ticket: DialogTicket,
    apply: impl FnOnce(&mut CollectionState) -> Result<R, ApiError>,
) -> Result<R, ApiError> {
    let mut state = app.lock();
    let result = if ticket.is_cancelled() {
        info!("result discarded: dialog closed");
        Err(ApiError::Cancelled)
    } else {
        apply(&mut state)
    };
    app.dialogs.finish(&ticket);
    result
}

#[derive(Serialize)]
pub struct PrioritizeResponse {
    pub case: Case,
    #[serde(flatten)]
    pub assessment: PriorityAssessment,
}

/// POST /api/cases/{id}/prioritize — Score a case and store the score.
pub async fn prioritize(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AssistParams>,
) -> Result<Json<PrioritizeResponse>, ApiError> {
    let input = {
        let state = app.lock();
        require_admin(&state)?;
        let case = state
            .case(&id)
            .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;
        PriorityInput::from(case)
    };

    let (assessment, ticket) = run_in_dialog::<PrioritizeCases>(
        &app,
        input,
        params.dialog_id.as_deref(),
        &PRIORITIZE_FAILED,
    )
    .await?;

    settle(&app, ticket, |state| {
        require_admin(state)?;
        let case = state.set_priority_score(&id, assessment.priority_score)?;
        info!("case {id} prioritized at {}", assessment.priority_score);
        Ok(Json(PrioritizeResponse { case, assessment }))
    })
}

/// POST /api/dcas/{id}/analyze — Summarize an agent's performance.
pub async fn analyze(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AssistParams>,
) -> Result<Json<PerformanceAnalysis>, ApiError> {
    let input = {
        let state = app.lock();
        require_admin(&state)?;
        let dca = state
            .dca(&id)
            .ok_or_else(|| ApiError::NotFound(format!("DCA {id} not found")))?;
        PerformanceInput::from(dca)
    };

    let (analysis, ticket) = run_in_dialog::<AnalyzeDcaPerformance>(
        &app,
        input,
        params.dialog_id.as_deref(),
        &ANALYZE_FAILED,
    )
    .await?;
    settle(&app, ticket, |state| {
        require_admin(state)?;
        Ok(Json(analysis))
    })
}

/// POST /api/cases/{id}/suggest-channel — Recommend a contact channel.
///
/// Agents may only ask about their own cases.
pub async fn suggest_channel(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AssistParams>,
) -> Result<Json<ChannelSuggestion>, ApiError> {
    let input = {
        let state = app.lock();
        let user = require_session(&state)?;
        let case = state
            .case(&id)
            .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;
        if let SessionUser::Agent { id: ref agent, .. } = user
            && !case.is_assigned_to(agent)
        {
            return Err(ApiError::Forbidden(format!(
                "case {id} is not assigned to {agent}"
            )));
        }
        ChannelInput::from(case)
    };

    let (suggestion, ticket) = run_in_dialog::<SuggestCommunicationMode>(
        &app,
        input,
        params.dialog_id.as_deref(),
        &SUGGEST_FAILED,
    )
    .await?;
    settle(&app, ticket, |state| {
        require_session(state)?;
        Ok(Json(suggestion))
    })
}

/// DELETE /api/dialogs/{id} — Close a dialog and cancel its AI call. 204.
pub async fn close_dialog(State(app): State<AppState>, Path(id): Path<String>) -> StatusCode {
    // Under the state lock so a close cannot slip in while a result is applied.
    let _state = app.lock();
    if app.dialogs.close(&id) {
        info!("dialog {id} closed with a call in flight");
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use smartcollect::backend::{ScriptedBackend, ScriptedReply};
    use smartcollect::tasks::TaskConfig;

    fn app_with(reply: &str) -> AppState {
        let backend = ScriptedBackend::new().with_reply(ScriptedReply::Text(reply.into()));
        AppState::new(
            Arc::new(Mutex::new(CollectionState::seeded())),
            Arc::new(backend),
            TaskConfig::default(),
        )
    }

    fn priority_input(app: &AppState) -> (String, PriorityInput) {
        let state = app.lock();
        let case = &state.cases()[0];
        (case.id.clone(), PriorityInput::from(case))
    }

    #[tokio::test]
    async fn finished_call_stays_open_until_settled() {
        let app = app_with(r#"{"priorityScore": 61, "priorityReason": "Late."}"#);
        let (id, input) = priority_input(&app);

        let (assessment, ticket) =
            run_in_dialog::<PrioritizeCases>(&app, input, Some("d1"), &PRIORITIZE_FAILED)
                .await
                .unwrap();
        assert_eq!(app.dialogs.in_flight(), 1);

        // Closed after the model answered but before the score was written.
        assert!(app.dialogs.close("d1"));
        let result = settle(&app, ticket, |state| {
            Ok(state.set_priority_score(&id, assessment.priority_score)?)
        });
        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert!(app.lock().case(&id).unwrap().priority_score.is_none());
        assert_eq!(app.dialogs.in_flight(), 0);
    }

    #[tokio::test]
    async fn settling_releases_the_dialog() {
        let app = app_with(r#"{"priorityScore": 61, "priorityReason": "Late."}"#);
        let (id, input) = priority_input(&app);

        let (assessment, ticket) =
            run_in_dialog::<PrioritizeCases>(&app, input, Some("d1"), &PRIORITIZE_FAILED)
                .await
                .unwrap();
        let case = settle(&app, ticket, |state| {
            Ok(state.set_priority_score(&id, assessment.priority_score)?)
        })
        .unwrap();
        assert_eq!(case.priority_score, Some(61.0));
        assert_eq!(app.dialogs.in_flight(), 0);
        assert!(!app.dialogs.close("d1"));
    }

    #[tokio::test]
    async fn failed_call_releases_the_dialog_and_posts_a_notice() {
        let app = app_with("not json");
        let (_, input) = priority_input(&app);

        let err = run_in_dialog::<PrioritizeCases>(&app, input, Some("d1"), &PRIORITIZE_FAILED)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream));
        assert_eq!(app.dialogs.in_flight(), 0);
        assert_eq!(
            app.lock().notices().latest().map(|n| n.title.clone()),
            Some("AI Prioritization Failed".to_string())
        );
    }
}

