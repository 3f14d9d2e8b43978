//! Structured prompt tasks.
//!
//! A [`PromptTask`] is a named triple of input type, output type and prompt
//! template. [`TaskRunner`] executes one task as a single, stateless call:
//!
//! ```text
//! input ──validate──▶ render template ──▶ model ──▶ parse JSON ──validate──▶ output
//! ```
//!
//! Any failure along the way ends the call with a [`TaskError`]. Callers show
//! [`TaskError::user_message`], which is the same for every kind of failure;
//! the variant itself is for logs. Nothing is retried, cached or stored.

pub mod analyze;
pub mod prioritize;
pub mod suggest;
pub mod template;
pub mod validate;

pub use analyze::{AnalyzeDcaPerformance, PerformanceAnalysis, PerformanceInput};
pub use prioritize::{PrioritizeCases, PriorityAssessment, PriorityInput};
pub use suggest::{ChannelInput, ChannelSuggestion, SuggestCommunicationMode};

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::{ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, Message, ResponseFormat};

/// System message sent ahead of every rendered task prompt.
pub const SYSTEM_PROMPT: &str = "You are an assistant embedded in a debt collection \
case-management console. Answer with a single JSON object that matches the \
requested schema. Do not add commentary outside the JSON.";

// ── PromptTask ─────────────────────────────────────────────────────

/// One structured prompt contract.
///
/// The input and output schemas are derived from the associated types with
/// `schemars`; doc comments on their fields become the field descriptions the
/// model sees.
pub trait PromptTask {
    /// Task identifier, also used as the JSON schema name in the request.
    const NAME: &'static str;
    /// Prompt template with placeholders keyed by input field names.
    const TEMPLATE: &'static str;

    type Input: Serialize + JsonSchema + Sync;
    type Output: DeserializeOwned + Serialize + JsonSchema;
}

// ── TaskConfig ─────────────────────────────────────────────────────

/// Model settings shared by all prompt tasks.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Maximum tokens in a reply. Default: [`DEFAULT_MAX_TOKENS`].
    pub max_tokens: u32,
    /// Sampling temperature. Default: `0.2`.
    pub temperature: f32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.2,
        }
    }
}

impl TaskConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

// ── TaskError ──────────────────────────────────────────────────────

/// Why a prompt task did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("input does not match the task schema: {}", .0.join("; "))]
    InvalidInput(Vec<String>),
    #[error("prompt template could not be rendered: {0}")]
    Template(String),
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model returned no output")]
    EmptyResponse,
    #[error("model reply is not a JSON object: {0}")]
    MalformedReply(String),
    #[error("model reply does not match the output schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),
    #[error("call was cancelled before it completed")]
    Cancelled,
}

impl TaskError {
    /// Generic message shown to users for every failure kind.
    pub const USER_MESSAGE: &'static str = "The AI request failed. Please try again.";

    /// The message to surface to a person. Deliberately the same for every
    /// variant.
    pub fn user_message(&self) -> &'static str {
        Self::USER_MESSAGE
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }
}

// ── TaskRunner ─────────────────────────────────────────────────────

/// Executes prompt tasks against a [`ChatBackend`].
///
/// Cheap to construct; holds a borrowed backend and a copy of the config.
pub struct TaskRunner<'a> {
    backend: &'a dyn ChatBackend,
    config: TaskConfig,
}

impl<'a> TaskRunner<'a> {
    pub fn new(backend: &'a dyn ChatBackend, config: TaskConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Validate `input` and render the task prompt without calling the model.
    pub fn render<T: PromptTask>(&self, input: &T::Input) -> Result<String, TaskError> {
        let input_value = input_value::<T>(input)?;
        let output_schema = crate::json_schema_for::<T::Output>();
        template::render(T::TEMPLATE, &input_value, &output_schema).map_err(TaskError::Template)
    }

    /// Build the request that [`run`](Self::run) would send.
    pub fn request<T: PromptTask>(&self, input: &T::Input) -> Result<ChatRequest, TaskError> {
        let prompt = self.render::<T>(input)?;
        Ok(ChatRequest {
            model: Some(self.config.model.clone()),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat::json_schema(
                T::NAME,
                crate::json_schema_for::<T::Output>(),
            )),
            ..Default::default()
        })
    }

    /// Run one task: a single model call, validated against the output schema.
    pub async fn run<T: PromptTask>(&self, input: &T::Input) -> Result<T::Output, TaskError> {
        let request = self.request::<T>(input)?;
        debug!(
            "[task] {} via {} ({} prompt chars)",
            T::NAME,
            self.backend.label(),
            request
                .messages
                .last()
                .and_then(|m| m.content.as_ref())
                .map_or(0, |c| c.len())
        );

        let result = self.execute::<T>(&request).await;
        match &result {
            Ok(_) => info!("[task] {} succeeded", T::NAME),
            Err(e) => warn!("[task] {} failed: {e}", T::NAME),
        }
        result
    }

    /// Like [`run`](Self::run), but gives up with [`TaskError::Cancelled`]
    /// as soon as `token` is cancelled. The in-flight request is dropped.
    pub async fn run_until_cancelled<T: PromptTask>(
        &self,
        input: &T::Input,
        token: &CancellationToken,
    ) -> Result<T::Output, TaskError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("[task] {} cancelled", T::NAME);
                Err(TaskError::Cancelled)
            }
            result = self.run::<T>(input) => result,
        }
    }

    async fn execute<T: PromptTask>(&self, request: &ChatRequest) -> Result<T::Output, TaskError> {
        let completion = self
            .backend
            .complete(request)
            .await
            .map_err(TaskError::Transport)?;

        let content = completion
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(TaskError::EmptyResponse)?;

        let value = validate::parse_reply(&content).map_err(TaskError::MalformedReply)?;

        let output_schema = crate::json_schema_for::<T::Output>();
        let violations = validate::schema_violations(&output_schema, &value);
        if !violations.is_empty() {
            return Err(TaskError::SchemaViolation(violations));
        }

        serde_json::from_value(value).map_err(|e| TaskError::SchemaViolation(vec![e.to_string()]))
    }
}

fn input_value<T: PromptTask>(input: &T::Input) -> Result<serde_json::Value, TaskError> {
    let value =
        serde_json::to_value(input).map_err(|e| TaskError::InvalidInput(vec![e.to_string()]))?;
    let violations =
        validate::schema_violations(&crate::json_schema_for::<T::Input>(), &value);
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(TaskError::InvalidInput(violations))
    }
}
