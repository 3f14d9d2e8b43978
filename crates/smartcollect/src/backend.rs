//! Model backends: the one seam between prompt tasks and the network.
//!
//! [`ChatBackend`] is implemented by [`OpenRouterClient`] for real calls and
//! by [`ScriptedBackend`] for tests and offline demos. The runner never knows
//! which one it is talking to.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::debug;

use crate::{ChatCompletion, ChatRequest, OpenRouterClient};

/// Boxed future returned by [`ChatBackend::complete`].
pub type CompletionFuture<'a> = BoxFuture<'a, Result<ChatCompletion, String>>;

/// Something that can answer a single chat completion request.
///
/// Uses a boxed future so that the trait is dyn-compatible and can be shared
/// as `Arc<dyn ChatBackend>` by the web server.
pub trait ChatBackend: Send + Sync {
    /// Send one request and wait for one completion. No retries.
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a>;

    /// Short label used in logs.
    fn label(&self) -> &str {
        "backend"
    }
}

impl ChatBackend for OpenRouterClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(self.chat(request))
    }

    fn label(&self) -> &str {
        "openrouter"
    }
}

// ── ScriptedBackend ────────────────────────────────────────────────

/// One canned reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// The completion text.
    Text(String),
    /// A completion with no content at all.
    Empty,
    /// A transport-level failure.
    Fail(String),
}

/// A backend that replays canned replies instead of calling a model.
///
/// Queued replies are consumed in order. Once the queue is empty, requests
/// whose JSON schema name has a fixed reply get that reply every time;
/// anything else fails. Every request is recorded for inspection.
///
/// # Example
///
/// ```
/// use smartcollect::backend::{ScriptedBackend, ScriptedReply};
///
/// let backend = ScriptedBackend::new()
///     .with_reply(ScriptedReply::Text(r#"{"priorityScore": 80, "priorityReason": "old debt"}"#.into()))
///     .with_reply(ScriptedReply::Fail("connection reset".into()));
/// assert_eq!(backend.pending(), 2);
/// ```
#[derive(Default)]
pub struct ScriptedBackend {
    queue: Mutex<VecDeque<ScriptedReply>>,
    fixed: HashMap<String, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn with_reply(self, reply: ScriptedReply) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    /// Answer every request for the named task schema with `reply` once the
    /// queue is drained.
    pub fn with_fixed_reply(mut self, task: impl Into<String>, reply: impl Into<String>) -> Self {
        self.fixed.insert(task.into(), reply.into());
        self
    }

    /// Wait this long before answering, to simulate a slow model.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A backend that answers all three shipped tasks with plausible,
    /// schema-conforming replies. Used by the `--offline` mode of the
    /// binaries.
    pub fn offline() -> Self {
        Self::new()
            .with_fixed_reply(
                "analyzeDcaPerformance",
                r#"{"analysisSummary":"Steady recovery on small balances; slower follow-up on older debts.","recommendedAssignments":"Assign recent, low-amount cases; pair long-overdue accounts with a senior agent."}"#,
            )
            .with_fixed_reply(
                "prioritizeCases",
                r#"{"priorityScore":72,"priorityReason":"Sizeable amount overdue for over a month with a moderate recovery rate."}"#,
            )
            .with_fixed_reply(
                "suggestCommunicationMode",
                r#"{"suggestedChannel":"messaging","reasoning":"The debtor has not answered calls but read earlier messages."}"#,
            )
    }

    /// Replies still queued.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_reply(&self, request: &ChatRequest) -> ScriptedReply {
        if let Some(reply) = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return reply;
        }
        match request.schema_name().and_then(|name| self.fixed.get(name)) {
            Some(text) => ScriptedReply::Text(text.clone()),
            None => ScriptedReply::Fail("no scripted reply left".into()),
        }
    }
}

impl ChatBackend for ScriptedBackend {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request.clone());
            let reply = self.next_reply(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            debug!("scripted reply: {reply:?}");
            match reply {
                ScriptedReply::Text(text) => Ok(ChatCompletion::text(text)),
                ScriptedReply::Empty => Ok(ChatCompletion::default()),
                ScriptedReply::Fail(message) => Err(message),
            }
        })
    }

    fn label(&self) -> &str {
        "scripted"
    }
}
