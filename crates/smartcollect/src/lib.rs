//! Debt-collection case management with schema-validated LLM helper calls.
//!
//! `smartcollect` holds everything the admin and agent consoles need that is
//! not presentation: the in-memory collection state (cases, collection
//! agents, schedule, session), credential verification, dashboard
//! aggregates, and the **prompt task runner** that turns a typed input record
//! into a typed, schema-checked answer from a hosted model.
//!
//! # Getting started
//!
//! ```ignore
//! use smartcollect::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("OPENROUTER_KEY").unwrap();
//!     let client = OpenRouterClient::new(api_key)?;
//!     let runner = TaskRunner::new(&client, TaskConfig::default());
//!
//!     let input = PriorityInput {
//!         overdue_aging: 45,
//!         due_amount: 10_000.0,
//!         recovery_rate: 0.6,
//!         has_overdue_history: 0,
//!     };
//!     match runner.run::<PrioritizeCases>(&input).await {
//!         Ok(score) => println!("{} ({})", score.priority_score, score.priority_reason),
//!         Err(e) => eprintln!("{}", e.user_message()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Prompt tasks:** [`PromptTask`](tasks::PromptTask) describes one
//!   (input schema, output schema, template) triple;
//!   [`TaskRunner`](tasks::TaskRunner) executes it. The three shipped tasks
//!   live in [`tasks::analyze`], [`tasks::prioritize`] and [`tasks::suggest`].
//! - **Model access:** [`ChatBackend`](backend::ChatBackend) is the seam.
//!   [`OpenRouterClient`] talks to the real API,
//!   [`ScriptedBackend`](backend::ScriptedBackend) replays canned replies.
//! - **Application data:** [`CollectionState`](state::CollectionState) owns
//!   cases, DCAs, the schedule and the logged-in user.
//! - **Logins:** [`auth`] hashes and verifies credentials.
//! - **Dialogs:** [`dialog::DialogRegistry`] discards results of AI calls whose
//!   dialog was closed while the call was in flight.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tasks`] | Prompt task trait, runner, template rendering, reply validation |
//! | [`backend`] | Model backend trait and the scripted backend |
//! | [`state`] | Cases, DCAs, schedule entries, notices, dashboard aggregates |
//! | [`auth`] | Salted SHA-256 credential verification and login outcomes |
//! | [`dialog`] | Per-dialog cancellation of in-flight model calls |

pub mod auth;
pub mod backend;
pub mod dialog;
pub mod prelude;
pub mod state;
pub mod tasks;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for all prompt tasks.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Default completion budget for a prompt task reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// Task inputs and outputs are plain Rust structs; this is where their
/// declared shape becomes the schema that is both sent to the model and used
/// to validate what comes back.
///
/// # Example
///
/// ```
/// use smartcollect::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Reply {
///     score: f64,
///     #[serde(default)]
///     note: Option<String>,
/// }
///
/// let schema = json_schema_for::<Reply>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"score".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

/// Rewrite a schemars schema into the subset that strict structured output
/// accepts.
///
/// Definitions are inlined (including schemars' single-element `allOf`
/// wrapper around a `$ref`), every object gets `additionalProperties: false`
/// with all of its properties required, and keywords outside the subset
/// (`$schema`, `title`, `format`, ranges and lengths) are dropped. The full
/// schema from [`json_schema_for`] is still what replies are validated
/// against.
pub fn strict_schema(schema: &serde_json::Value) -> serde_json::Value {
    let definitions = schema
        .get("definitions")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    strict_node(schema, &definitions)
}

fn strict_node(node: &serde_json::Value, definitions: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    let Value::Object(map) = node else {
        return node.clone();
    };

    if let Some(resolved) = referenced_definition(node, definitions) {
        let mut out = strict_node(resolved, definitions);
        if let (Some(description), Value::Object(out)) = (map.get("description"), &mut out) {
            out.insert("description".into(), description.clone());
        }
        return out;
    }

    let mut out = serde_json::Map::new();
    for (key, value) in map {
        match key.as_str() {
            "type" | "enum" | "const" | "description" => {
                out.insert(key.clone(), value.clone());
            }
            "items" => {
                out.insert(key.clone(), strict_node(value, definitions));
            }
            "anyOf" | "oneOf" => {
                let variants = value
                    .as_array()
                    .map(|vs| vs.iter().map(|v| strict_node(v, definitions)).collect())
                    .unwrap_or_default();
                out.insert("anyOf".into(), Value::Array(variants));
            }
            "properties" => {
                let properties: serde_json::Map<String, Value> = value
                    .as_object()
                    .map(|props| {
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), strict_node(prop, definitions)))
                            .collect()
                    })
                    .unwrap_or_default();
                let mut required: Vec<&String> = properties.keys().collect();
                required.sort();
                out.insert(
                    "required".into(),
                    Value::Array(required.into_iter().map(|k| Value::from(k.as_str())).collect()),
                );
                out.insert("properties".into(), Value::Object(properties));
            }
            _ => {}
        }
    }
    if out.contains_key("properties") {
        out.insert("additionalProperties".into(), Value::Bool(false));
    }
    Value::Object(out)
}

/// The definition `node` points at, either directly through `$ref` or through
/// a single-element `allOf`.
fn referenced_definition<'a>(
    node: &'a serde_json::Value,
    definitions: &'a serde_json::Value,
) -> Option<&'a serde_json::Value> {
    let target = match node.get("allOf").and_then(|v| v.as_array()).map(Vec::as_slice) {
        Some([only]) => only,
        _ => node,
    };
    let reference = target.get("$ref")?.as_str()?;
    definitions.get(reference.strip_prefix("#/definitions/")?)
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Name of the JSON schema the reply must follow, if one was requested.
    pub fn schema_name(&self) -> Option<&str> {
        self.response_format
            .as_ref()
            .and_then(|f| f.json_schema.as_ref())
            .map(|s| s.name.as_str())
    }
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

/// JSON output format type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_object")]
    JsonObject,
    #[serde(rename = "json_schema")]
    JsonSchema,
}

/// Structured output request: the provider is asked to conform its answer
/// to `schema`.
#[derive(Serialize, Debug, Clone)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

/// JSON output mode.
#[derive(Serialize, Debug, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaFormat>,
}

impl ResponseFormat {
    /// Free-form JSON object output.
    pub fn json_object() -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonObject,
            json_schema: None,
        }
    }

    /// Output constrained to a named JSON schema. The schema is sent in its
    /// [`strict_schema`] form.
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonSchema,
            json_schema: Some(JsonSchemaFormat {
                name: name.into(),
                strict: true,
                schema: strict_schema(&schema),
            }),
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`OpenRouterClient::chat()`].
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// A completion carrying only text, as produced by scripted backends.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
            finish_reason: Some("stop".into()),
        }
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) endpoint: String,
    pub(crate) referer: String,
    pub(crate) title: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_headers(
            api_key,
            "https://github.com/smartcollect/smartcollect",
            "smartcollect",
        )
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("smartcollect/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: OPENROUTER_URL.to_string(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    /// Point the client at an OpenRouter-compatible endpoint other than the
    /// public one.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        let model_label = body.model.as_deref().unwrap_or("(none)");
        debug!(
            "LLM request: model={}, messages={}, schema={}, max_tokens={}, temp={}",
            model_label,
            body.messages.len(),
            body.schema_name().unwrap_or("(none)"),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        let elapsed = start.elapsed();
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            elapsed.as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("OpenRouter API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;

        if let Some(err) = parsed.error {
            return Err(format!("OpenRouter API error: {}", err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        match parsed.choices.and_then(|c| c.into_iter().next()) {
            Some(c) => {
                debug!(
                    "LLM output: {} chars",
                    c.message.content.as_ref().map_or(0, |s| s.len())
                );
                Ok(ChatCompletion {
                    content: c.message.content,
                    usage: parsed.usage,
                    finish_reason: c.finish_reason,
                })
            }
            None => {
                debug!("LLM output: empty (no choices)");
                Ok(ChatCompletion {
                    content: None,
                    usage: parsed.usage,
                    finish_reason: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant_text("prefill");
        assert_eq!(assist.role, MessageRole::Assistant);
        assert_eq!(assist.content.as_deref(), Some("prefill"));
    }

    #[test]
    fn chat_request_default_skips_none_fields() {
        let req = ChatRequest {
            model: Some("test-model".into()),
            messages: vec![Message::user("hi")],
            max_tokens: 100,
            temperature: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("seed").is_none());
        assert!(json.get("response_format").is_none());
        assert_eq!(json["model"], "test-model");
    }

    #[test]
    fn json_schema_response_format_shape() {
        let format = ResponseFormat::json_schema(
            "prioritizeCases",
            serde_json::json!({"type": "object"}),
        );
        let json = serde_json::to_value(&format).unwrap();
        assert_eq!(json["type"], "json_schema");
        assert_eq!(json["json_schema"]["name"], "prioritizeCases");
        assert_eq!(json["json_schema"]["strict"], true);
        assert_eq!(json["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn schema_name_reads_through_format() {
        let req = ChatRequest {
            response_format: Some(ResponseFormat::json_schema(
                "suggestCommunicationMode",
                serde_json::json!({}),
            )),
            ..Default::default()
        };
        assert_eq!(req.schema_name(), Some("suggestCommunicationMode"));
        assert_eq!(ChatRequest::default().schema_name(), None);
        let plain = ChatRequest {
            response_format: Some(ResponseFormat::json_object()),
            ..Default::default()
        };
        assert_eq!(plain.schema_name(), None);
    }

    #[test]
    fn raw_response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"{\"a\":1}"},"finish_reason":"stop"}],
                       "usage":{"prompt_tokens":10,"completion_tokens":3,"total_tokens":13}}"#;
        let parsed: RawChatResponse = serde_json::from_str(body).unwrap();
        let choice = parsed.choices.unwrap().into_iter().next().unwrap();
        assert_eq!(choice.message.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(parsed.usage.unwrap().total_tokens, Some(13));
    }

    #[test]
    fn strict_schema_inlines_refs_and_closes_objects() {
        let full = json_schema_for::<tasks::ChannelSuggestion>();
        assert!(full.get("$schema").is_some());
        assert!(full["properties"]["suggestedChannel"].get("allOf").is_some());

        let strict = strict_schema(&full);
        assert_eq!(strict["additionalProperties"], false);
        for key in ["$schema", "title", "definitions"] {
            assert!(strict.get(key).is_none(), "{key} survived");
        }
        let channel = &strict["properties"]["suggestedChannel"];
        assert!(channel.get("allOf").is_none());
        assert_eq!(channel["enum"], serde_json::json!(["calling", "email", "messaging"]));
    }

    #[test]
    fn strict_schema_closes_nested_objects_and_drops_formats() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "score": {"type": "number", "format": "double", "minimum": 0.0},
                "tags": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string", "minLength": 1}}}
                }
            },
            "required": ["score"]
        });
        let strict = strict_schema(&schema);
        assert_eq!(strict["required"], serde_json::json!(["score", "tags"]));
        assert_eq!(strict["properties"]["score"], serde_json::json!({"type": "number"}));
        let item = &strict["properties"]["tags"]["items"];
        assert_eq!(item["additionalProperties"], false);
        assert_eq!(item["properties"]["name"], serde_json::json!({"type": "string"}));
    }
}
