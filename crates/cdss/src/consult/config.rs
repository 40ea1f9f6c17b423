//! Request settings for the consultant.

use crate::api::RetryConfig;
use crate::config::LlmSettings;
use crate::consult::prompt::{SECTION_LABELS, system_prompt};
use crate::consult::sections::Boundary;
use crate::{ChatRequest, DEFAULT_MODEL, Message};

/// Default completion token limit for one reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Sampling temperature for every call.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Retries on transient failures.
pub const DEFAULT_RETRIES: u32 = 2;

/// Configuration for a [`Consultant`](super::consultant::Consultant).
///
/// ```
/// use cdss::consult::config::ConsultConfig;
///
/// let config = ConsultConfig::default()
///     .with_model("gpt-4o-mini")
///     .with_temperature(0.1);
/// assert_eq!(config.model, "gpt-4o-mini");
/// assert_eq!(config.section_labels.len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct ConsultConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry: RetryConfig,
    pub system_prompt: String,
    /// Labels requested from the model and used to split its reply.
    pub section_labels: Vec<String>,
    pub boundary: Boundary,
}

impl Default for ConsultConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryConfig::with_retries(DEFAULT_RETRIES),
            system_prompt: system_prompt(),
            section_labels: SECTION_LABELS.iter().map(|s| s.to_string()).collect(),
            boundary: Boundary::default(),
        }
    }
}

impl ConsultConfig {
    /// Defaults overridden by whatever the `[llm]` table sets.
    pub fn from_llm_settings(llm: &LlmSettings) -> Self {
        let mut config = Self::default();
        if let Some(model) = &llm.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = llm.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(temperature) = llm.temperature {
            config.temperature = temperature;
        }
        if let Some(retries) = llm.retries {
            config.retry.max_retries = retries;
        }
        config
    }

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

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Wrap `messages` in a request with this config's model settings.
    pub fn request(&self, messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConsultConfig::default();
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.max_tokens, 1500);
        assert!((c.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(c.retry.max_retries, 2);
        assert_eq!(c.boundary, Boundary::NextLabel);
        assert_eq!(c.section_labels[5], "ICD-11 Code");
    }

    #[test]
    fn llm_settings_override_only_what_they_set() {
        let llm = LlmSettings {
            model: Some("gpt-4.1".into()),
            retries: Some(0),
            ..Default::default()
        };
        let c = ConsultConfig::from_llm_settings(&llm);
        assert_eq!(c.model, "gpt-4.1");
        assert_eq!(c.retry.max_retries, 0);
        assert_eq!(c.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn request_carries_model_settings() {
        let c = ConsultConfig::default().with_max_tokens(200);
        let req = c.request(vec![Message::user("hi")]);
        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.max_tokens, 200);
        assert_eq!(req.messages.len(), 1);
    }
}
