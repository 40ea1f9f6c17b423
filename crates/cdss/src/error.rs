//! Error taxonomy for consultation flows.
//!
//! Each concern gets its own enum so the boundary that handles it can match
//! exhaustively. [`ConsultError`] aggregates the three request-time kinds.
//! A missing section in a model reply is not an error and has no variant
//! here; see [`Extraction::Missing`](crate::consult::sections::Extraction).

use std::path::PathBuf;

use thiserror::Error;

/// The credential or secrets file is unusable. Blocks every LLM call.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No API key in the environment or the secrets file.
    #[error("API key not found. Set {env_var} or add API_KEY to {path}.")]
    MissingCredential { env_var: String, path: PathBuf },

    #[error("failed to read secrets file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The key could not be turned into an HTTP header or client.
    #[error("invalid LLM client configuration: {0}")]
    InvalidClient(String),
}

/// Input rejected locally, before any prompt is composed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least one symptom.")]
    NoSymptoms,

    #[error("'{symptom}' is not a symptom listed under {category}.")]
    UnknownSymptom { symptom: String, category: String },

    #[error("Please enter a follow-up question.")]
    EmptyQuestion,
}

/// The LLM collaborator failed for one request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalCallError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("LLM API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 200 with an `error` object in the body.
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("failed to parse response: {0}")]
    Malformed(String),

    #[error("LLM returned no text")]
    EmptyResponse,
}

impl ExternalCallError {
    /// Whether retrying the same request might succeed.
    ///
    /// Rate limits, server errors, timeouts, and connection failures are
    /// transient. Client errors (400, 401, 403, 404, 422) and unparseable
    /// bodies are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Api(_) | Self::Malformed(_) | Self::EmptyResponse => false,
        }
    }
}

impl From<reqwest::Error> for ExternalCallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Any failure of a single request/response cycle.
#[derive(Debug, Error)]
pub enum ConsultError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ExternalCall(#[from] ExternalCallError),
}

impl ConsultError {
    /// Whether the user can fix this by editing input or trying again.
    /// Configuration errors need an operator.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    /// Message suitable for showing to the clinician.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(e) => e.to_string(),
            Self::Validation(e) => e.to_string(),
            Self::ExternalCall(e) => {
                format!("The recommendation service is unavailable ({e}). Please try again.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_transient() {
        for status in [429, 500, 502, 503, 504] {
            let e = ExternalCallError::Http {
                status,
                body: String::new(),
            };
            assert!(e.is_transient(), "HTTP {status} should be transient");
        }
        assert!(ExternalCallError::Timeout.is_transient());
        assert!(ExternalCallError::Network("connection reset".into()).is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in [400, 401, 403, 404, 422] {
            let e = ExternalCallError::Http {
                status,
                body: String::new(),
            };
            assert!(!e.is_transient(), "HTTP {status} should not be retried");
        }
        assert!(!ExternalCallError::Malformed("eof".into()).is_transient());
        assert!(!ExternalCallError::EmptyResponse.is_transient());
    }

    #[test]
    fn validation_messages_are_user_facing() {
        let e = ConsultError::from(ValidationError::NoSymptoms);
        assert_eq!(e.user_message(), "Please select at least one symptom.");
        assert!(e.is_recoverable());
    }

    #[test]
    fn configuration_errors_are_not_recoverable() {
        let e = ConsultError::from(ConfigurationError::MissingCredential {
            env_var: "CDSS_API_KEY".into(),
            path: PathBuf::from("secrets.toml"),
        });
        assert!(!e.is_recoverable());
        assert!(e.user_message().contains("API key not found"));
    }

    #[test]
    fn external_call_message_mentions_retry() {
        let e = ConsultError::from(ExternalCallError::Timeout);
        assert!(e.user_message().contains("try again"));
    }
}
