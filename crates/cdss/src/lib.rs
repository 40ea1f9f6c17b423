//! LLM-backed clinical decision support for psychiatrists.
//!
//! `cdss` turns a structured clinical presentation (symptom category,
//! symptoms, severity, history, medications) into a prompt for an
//! OpenAI-compatible chat completions endpoint, then splits the free-text
//! reply into six labeled sections for display. Follow-up questions are asked
//! against the same [`Session`](consult::session::Session), whose
//! [`ConversationLog`](consult::log::ConversationLog) records every exchange.
//!
//! # Getting started
//!
//! ```ignore
//! use cdss::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ConsultError> {
//!     let settings = Settings::load("secrets.toml")?;
//!     let consultant = Consultant::from_settings(&settings)?;
//!     let mut session = Session::new();
//!
//!     let input = ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Moderate)
//!         .with_symptoms(["Persistent sadness", "Insomnia"]);
//!
//!     let rec = consultant.generate_recommendations(&mut session, &input).await?;
//!     for section in rec.sections() {
//!         println!("{}: {}", section.label, section.text());
//!     }
//!
//!     let answer = consultant
//!         .ask_follow_up(&mut session, "Would CBT-I be appropriate?")
//!         .await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Input model:** [`clinical`]: [`ClinicalInput`](clinical::ClinicalInput),
//!   [`SymptomCategory`](clinical::SymptomCategory), [`Severity`](clinical::Severity).
//! - **Prompt text:** [`consult::prompt`]: the recommendation template and
//!   the follow-up context prompt.
//! - **Splitting replies:** [`consult::sections`]: `sectionize` and the
//!   `Found | Missing` extraction result.
//! - **History:** [`consult::log`] and [`consult::session`].
//! - **Request flows:** [`Consultant`](consult::consultant::Consultant).
//! - **Credentials:** [`config`] loads `secrets.toml` and `CDSS_API_KEY`.
//! - **Errors:** [`error`]: configuration, validation, external call.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`clinical`] | Input types and the fixed symptom catalog |
//! | [`consult`] | Composer, sectionizer, conversation log, session, consultant |
//! | [`config`] | Secrets file and environment credential loading |
//! | [`api`] | Retry with backoff, trace ids |
//! | [`error`] | Error taxonomy |

pub mod api;
pub mod clinical;
pub mod config;
pub mod consult;
pub mod error;
pub mod prelude;

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigurationError, ExternalCallError};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for recommendation and follow-up calls.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the chat request.
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

/// A message in the chat request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Request / response ─────────────────────────────────────────────

/// Chat completion request body. Zero-valued generation parameters are
/// omitted so the provider default applies.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

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
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Extract the single text string from a raw response body.
///
/// Only `choices[0].message.content` is consumed; an `error` object, a
/// missing choice, or blank content are all failures.
pub fn parse_completion(body: &str) -> Result<String, ExternalCallError> {
    let parsed: RawChatResponse =
        serde_json::from_str(body).map_err(|e| ExternalCallError::Malformed(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(ExternalCallError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ExternalCallError::EmptyResponse)
}

// ── Backend seam ───────────────────────────────────────────────────

/// Boxed future returned by [`ChatBackend::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ExternalCallError>> + Send + 'a>>;

/// The LLM collaborator: takes messages and settings, returns one text string.
///
/// Uses a boxed future so the trait is dyn-compatible; the consultant holds
/// an `Arc<dyn ChatBackend>`.
pub trait ChatBackend: Send + Sync {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a>;
}

/// A closure-backed [`ChatBackend`], for tests and offline demos.
///
/// ```
/// use cdss::{ChatBackend, ChatRequest, FnBackend, Message};
///
/// let backend = FnBackend::new(|req: &ChatRequest| {
///     Ok(format!("echo: {}", req.messages.last().map_or("", |m| m.content.as_str())))
/// });
/// let req = ChatRequest {
///     messages: vec![Message::user("hi")],
///     ..Default::default()
/// };
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let text = rt.block_on(backend.complete(&req)).unwrap();
/// assert_eq!(text, "echo: hi");
/// ```
pub struct FnBackend<F> {
    f: F,
}

impl<F> FnBackend<F>
where
    F: Fn(&ChatRequest) -> Result<String, ExternalCallError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ChatBackend for FnBackend<F>
where
    F: Fn(&ChatRequest) -> Result<String, ExternalCallError> + Send + Sync,
{
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        let result = (self.f)(request);
        Box::pin(async move { result })
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl OpenAiClient {
    /// Create a client for the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::with_url(api_key, OPENAI_CHAT_URL)
    }

    /// Create a client for a custom endpoint (Azure, a local proxy, etc.).
    pub fn with_url(
        api_key: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cdss/", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ConfigurationError::InvalidClient(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: url.into(),
        })
    }

    /// Send a chat completion request and return the reply text.
    pub async fn chat(&self, body: &ChatRequest) -> Result<String, ExternalCallError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
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
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ExternalCallError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let content = parse_completion(&text)?;
        debug!("LLM output: {} chars", content.len());
        Ok(content)
    }
}

impl ChatBackend for OpenAiClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(self.chat(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");
        assert_eq!(Message::user("q").role, MessageRole::User);
        assert_eq!(Message::assistant("a").role, MessageRole::Assistant);
    }

    #[test]
    fn chat_request_skips_zero_fields() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn parse_completion_reads_first_choice() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Likely Diagnosis: MDD"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "Likely Diagnosis: MDD");
    }

    #[test]
    fn parse_completion_surfaces_api_error() {
        let body = r#"{"error": {"message": "quota exceeded"}}"#;
        assert_eq!(
            parse_completion(body),
            Err(ExternalCallError::Api("quota exceeded".into()))
        );
    }

    #[test]
    fn parse_completion_rejects_garbage_and_empty() {
        assert!(matches!(
            parse_completion("<html>"),
            Err(ExternalCallError::Malformed(_))
        ));
        assert_eq!(
            parse_completion(r#"{"choices": []}"#),
            Err(ExternalCallError::EmptyResponse)
        );
        assert_eq!(
            parse_completion(r#"{"choices": [{"message": {"content": "  "}}]}"#),
            Err(ExternalCallError::EmptyResponse)
        );
    }

    #[tokio::test]
    async fn fn_backend_passes_request_through() {
        let backend = FnBackend::new(|req: &ChatRequest| Ok(req.model.clone()));
        let req = ChatRequest {
            model: "test-model".into(),
            ..Default::default()
        };
        assert_eq!(backend.complete(&req).await.unwrap(), "test-model");
    }
}
