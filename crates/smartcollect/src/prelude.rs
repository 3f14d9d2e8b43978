//! Convenience re-exports for common `smartcollect` types.
//!
//! ```ignore
//! use smartcollect::prelude::*;
//! ```
//!
//! Covers the model client, the task runner and its three tasks, and the
//! collection state. Template and validation helpers stay in their modules.

// ── Model access ────────────────────────────────────────────────────
pub use crate::backend::{ChatBackend, ScriptedBackend, ScriptedReply};
pub use crate::{ChatCompletion, ChatRequest, Message, OpenRouterClient, json_schema_for};

// ── Prompt tasks ────────────────────────────────────────────────────
pub use crate::tasks::{
    AnalyzeDcaPerformance, ChannelInput, ChannelSuggestion, PerformanceAnalysis,
    PerformanceInput, PrioritizeCases, PriorityAssessment, PriorityInput, PromptTask,
    SuggestCommunicationMode, TaskConfig, TaskError, TaskRunner,
};

// ── Application state ───────────────────────────────────────────────
pub use crate::auth::{CredentialVerifier, LoginOutcome, SessionUser, Sha256Verifier};
pub use crate::dialog::{DialogRegistry, DialogTicket};
pub use crate::state::{
    Case, CaseStatus, CaseUpdate, CollectionState, CommunicationChannel, DashboardSummary, Dca,
    NewCase, NewDca, NewScheduleEntry, NoticeVariant, ScheduleEntry, ScheduleUpdate, StateError,
};
