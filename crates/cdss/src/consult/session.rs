//! Per-clinician interaction state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::generate_session_id;
use crate::clinical::ClinicalInput;
use crate::consult::log::{ConversationLog, HistoryEntry};

/// One clinician's consultation: the log plus the last submitted input.
///
/// Sessions are plain values owned by the caller. The CLI keeps one on the
/// stack; the web server keeps one per session id in its store.
#[derive(Serialize, Clone, Debug)]
pub struct Session {
    id: String,
    log: ConversationLog,
    last_input: Option<ClinicalInput>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(generate_session_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log: ConversationLog::new(),
            last_input: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.log.all()
    }

    /// The input most recently used for a recommendation, if any.
    pub fn context(&self) -> Option<&ClinicalInput> {
        self.last_input.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Store a successful recommendation: remember the input and append the
    /// reply as one AI entry.
    pub fn record_recommendation(&mut self, input: &ClinicalInput, text: impl Into<String>) {
        self.last_input = Some(input.clone());
        self.log.append(HistoryEntry::ai(text));
    }

    /// Store a successful follow-up as a Doctor/AI pair.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.log.record_exchange(question, answer);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::{Severity, SymptomCategory};
    use crate::consult::log::Role;

    #[test]
    fn new_session_is_empty() {
        let s = Session::new();
        assert!(s.id().starts_with("ss-"));
        assert!(s.history().is_empty());
        assert!(s.context().is_none());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }

    #[test]
    fn recommendation_sets_context_and_logs_ai_entry() {
        let input = ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Mild)
            .with_symptoms(["Fatigue"]);
        let mut s = Session::with_id("test");
        s.record_recommendation(&input, "Likely Diagnosis: X");
        assert_eq!(s.context(), Some(&input));
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].role, Role::Ai);
    }

    #[test]
    fn later_recommendation_replaces_context() {
        let first = ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Mild)
            .with_symptoms(["Fatigue"]);
        let second = ClinicalInput::new(SymptomCategory::AnxietyDisorders, Severity::Severe)
            .with_symptoms(["Restlessness"]);
        let mut s = Session::with_id("test");
        s.record_recommendation(&first, "a");
        s.record_recommendation(&second, "b");
        assert_eq!(s.context(), Some(&second));
        assert_eq!(s.history().len(), 2);
    }
}
