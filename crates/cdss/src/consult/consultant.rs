//! The two request flows: generate recommendations and ask a follow-up.
//!
//! Each flow is one request/response cycle. Nothing reaches the backend
//! until validation passes, and nothing is appended to the session log
//! unless the call succeeds. A failed call leaves the session exactly as it
//! was.
//!
//! The session-mutating methods ([`Consultant::generate_recommendations`],
//! [`Consultant::ask_follow_up`]) are thin wrappers around the pure ones
//! ([`Consultant::recommend`], [`Consultant::answer`]). Callers that cannot
//! hold a `&mut Session` across the await, such as the web server, use the
//! pure methods and record the result themselves.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::api::{generate_trace_id, retry_call};
use crate::clinical::ClinicalInput;
use crate::config::Settings;
use crate::consult::config::ConsultConfig;
use crate::consult::log::HistoryEntry;
use crate::consult::prompt::{compose, follow_up_messages};
use crate::consult::recommendation::Recommendation;
use crate::consult::session::Session;
use crate::error::{ConfigurationError, ConsultError, ExternalCallError, ValidationError};
use crate::{ChatBackend, ChatRequest, Message, OPENAI_CHAT_URL, OpenAiClient};

pub struct Consultant {
    backend: Arc<dyn ChatBackend>,
    config: ConsultConfig,
}

impl Consultant {
    pub fn new(backend: Arc<dyn ChatBackend>, config: ConsultConfig) -> Self {
        Self { backend, config }
    }

    /// Build an OpenAI-backed consultant from loaded settings.
    ///
    /// Fails with [`ConfigurationError::MissingCredential`] when no key is
    /// configured, so no call can be attempted without one.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        let key = settings.api_key()?;
        let url = settings.llm.base_url.as_deref().unwrap_or(OPENAI_CHAT_URL);
        let client = OpenAiClient::with_url(key, url)?;
        Ok(Self::new(
            Arc::new(client),
            ConsultConfig::from_llm_settings(&settings.llm),
        ))
    }

    pub fn config(&self) -> &ConsultConfig {
        &self.config
    }

    /// Validate `input`, compose the prompt and fetch a recommendation.
    pub async fn recommend(&self, input: &ClinicalInput) -> Result<Recommendation, ConsultError> {
        input.validate_for_recommendation()?;

        let messages = vec![
            Message::system(self.config.system_prompt.clone()),
            Message::user(compose(input)),
        ];
        info!(
            "Requesting recommendation: category={}, symptoms={}, severity={}",
            input.category,
            input.symptoms.len(),
            input.severity
        );
        let text = self.call("recommendation", self.config.request(messages)).await?;
        let rec = Recommendation::new(
            text,
            self.config.section_labels.clone(),
            self.config.boundary,
        );
        if !rec.has_sections() {
            warn!("Recommendation reply contained none of the requested section labels");
        }
        Ok(rec)
    }

    /// Answer `question` given the session's context input and prior log.
    pub async fn answer(
        &self,
        context: Option<&ClinicalInput>,
        history: &[HistoryEntry],
        question: &str,
    ) -> Result<String, ConsultError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        let messages = follow_up_messages(&self.config.system_prompt, context, history, question);
        info!(
            "Requesting follow-up answer: history={}, has_context={}",
            history.len(),
            context.is_some()
        );
        Ok(self.call("follow_up", self.config.request(messages)).await?)
    }

    /// Recommend and, on success, record the input and reply in `session`.
    pub async fn generate_recommendations(
        &self,
        session: &mut Session,
        input: &ClinicalInput,
    ) -> Result<Recommendation, ConsultError> {
        let rec = self.recommend(input).await?;
        session.record_recommendation(input, rec.text());
        Ok(rec)
    }

    /// Answer and, on success, append the question and answer to `session`.
    pub async fn ask_follow_up(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<String, ConsultError> {
        let answer = self
            .answer(session.context(), session.history(), question)
            .await?;
        session.record_exchange(question.trim(), answer.clone());
        Ok(answer)
    }

    async fn call(&self, kind: &str, request: ChatRequest) -> Result<String, ExternalCallError> {
        let trace_id = generate_trace_id();
        let span = info_span!("llm_call", %trace_id, kind);
        async {
            let start = Instant::now();
            let backend = &self.backend;
            let request = &request;
            let result = retry_call(&self.config.retry, move || backend.complete(request)).await;
            match &result {
                Ok(text) => debug!(
                    "LLM call succeeded in {:.1}s ({} chars)",
                    start.elapsed().as_secs_f64(),
                    text.len()
                ),
                Err(e) => warn!("LLM call failed: {e}"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnBackend;
    use crate::api::RetryConfig;
    use crate::clinical::{Severity, SymptomCategory};
    use crate::consult::log::Role;
    use crate::consult::prompt::NOT_PROVIDED;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    const REPLY: &str = "Likely Diagnosis: MDD\nDifferential Diagnoses: GAD\n\
Clinical Reasoning: r\nTreatment Plan: t\nMonitoring and Follow-up: m\nICD-11 Code: 6A70";

    fn consultant<F>(f: F) -> Consultant
    where
        F: Fn(&ChatRequest) -> Result<String, ExternalCallError> + Send + Sync + 'static,
    {
        Consultant::new(
            Arc::new(FnBackend::new(f)),
            ConsultConfig::default().with_retry(RetryConfig::immediate(2)),
        )
    }

    fn input() -> ClinicalInput {
        ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Moderate)
            .with_symptoms(["Persistent sadness", "Insomnia"])
    }

    #[tokio::test]
    async fn empty_symptoms_never_reach_backend() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let c = consultant(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(REPLY.into())
        });
        let mut session = Session::new();
        let empty = ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Moderate);

        let err = c.generate_recommendations(&mut session, &empty).await.unwrap_err();

        assert!(matches!(err, ConsultError::Validation(ValidationError::NoSymptoms)));
        assert_eq!(err.user_message(), "Please select at least one symptom.");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn recommendation_is_sectioned_and_logged() {
        let c = consultant(|_| Ok(REPLY.into()));
        let mut session = Session::new();

        let rec = c.generate_recommendations(&mut session, &input()).await.unwrap();

        let sections = rec.sections();
        assert_eq!(sections[0].text(), "MDD");
        assert_eq!(sections[5].text(), "6A70");
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].text, REPLY);
        assert_eq!(session.context(), Some(&input()));
    }

    #[tokio::test]
    async fn prompt_sent_is_the_composed_template() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let c = consultant(move |req| {
            sink.lock().unwrap().push(req.messages.clone());
            Ok(REPLY.into())
        });

        c.recommend(&input()).await.unwrap();

        let seen = seen.lock().unwrap();
        let messages = &seen[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, compose(&input()));
        assert_eq!(messages[1].content.matches(NOT_PROVIDED).count(), 2);
    }

    #[tokio::test]
    async fn failed_call_leaves_log_unchanged() {
        let c = consultant(|_| {
            Err(ExternalCallError::Http {
                status: 401,
                body: "invalid key".into(),
            })
        });
        let mut session = Session::new();

        let err = c.generate_recommendations(&mut session, &input()).await.unwrap_err();
        assert!(matches!(err, ConsultError::ExternalCall(_)));
        assert!(session.history().is_empty());
        assert!(session.context().is_none());

        let err = c.ask_follow_up(&mut session, "Any thoughts?").await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let c = consultant(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ExternalCallError::Timeout)
            } else {
                Ok(REPLY.into())
            }
        });

        assert!(c.recommend(&input()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let c = consultant(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("answer".into())
        });
        let mut session = Session::new();

        let err = c.ask_follow_up(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, ConsultError::Validation(ValidationError::EmptyQuestion)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn follow_up_appends_pair_after_recommendation() {
        let c = consultant(|req| {
            let last = req.messages.last().map_or("", |m| m.content.as_str());
            if last.contains("## Question") {
                Ok("Consider CBT-I.".into())
            } else {
                Ok(REPLY.into())
            }
        });
        let mut session = Session::new();

        c.generate_recommendations(&mut session, &input()).await.unwrap();
        let answer = c.ask_follow_up(&mut session, " Sleep advice? ").await.unwrap();

        assert_eq!(answer, "Consider CBT-I.");
        let view: Vec<(Role, &str)> = session
            .history()
            .iter()
            .map(|e| (e.role, e.text.as_str()))
            .collect();
        assert_eq!(
            view,
            vec![
                (Role::Ai, REPLY),
                (Role::Doctor, "Sleep advice?"),
                (Role::Ai, "Consider CBT-I."),
            ]
        );
    }

    #[tokio::test]
    async fn follow_up_replays_history_to_backend() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let c = consultant(move |req| {
            sink.lock().unwrap().push(req.messages.len());
            Ok(REPLY.into())
        });
        let mut session = Session::new();

        c.generate_recommendations(&mut session, &input()).await.unwrap();
        c.ask_follow_up(&mut session, "First?").await.unwrap();
        c.ask_follow_up(&mut session, "Second?").await.unwrap();

        // system + prior entries + question
        assert_eq!(*seen.lock().unwrap(), vec![2, 3, 5]);
    }

    #[test]
    fn from_settings_without_key_is_configuration_error() {
        let settings = Settings::from_key(None);
        assert!(matches!(
            Consultant::from_settings(&settings),
            Err(ConfigurationError::MissingCredential { .. })
        ));
    }

    #[test]
    fn from_settings_applies_llm_overrides() {
        let mut settings = Settings::from_key(Some("sk-test".into()));
        settings.llm.model = Some("gpt-4o-mini".into());
        let c = Consultant::from_settings(&settings).unwrap();
        assert_eq!(c.config().model, "gpt-4o-mini");
    }
}
