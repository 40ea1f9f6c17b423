//! Prompt composition.
//!
//! [`compose`] renders a [`ClinicalInput`] into the recommendation prompt;
//! [`compose_follow_up`] renders the context block for a follow-up question.
//! Both are pure. Every field is always rendered, with [`NOT_PROVIDED`] in
//! place of absent values, so the template shape never varies.

use crate::Message;
use crate::clinical::ClinicalInput;
use crate::consult::log::HistoryEntry;

/// Placeholder rendered for any empty field.
pub const NOT_PROVIDED: &str = "Not provided";

/// The six section labels requested from the model, in display order.
pub const SECTION_LABELS: [&str; 6] = [
    "Likely Diagnosis",
    "Differential Diagnoses",
    "Clinical Reasoning",
    "Treatment Plan",
    "Monitoring and Follow-up",
    "ICD-11 Code",
];

/// Guideline sources named in every prompt.
pub const GUIDELINE_SOURCES: &str =
    "DSM-5-TR, ICD-11, NICE guidance and the Maudsley Prescribing Guidelines";

/// System message sent ahead of every request.
pub fn system_prompt() -> String {
    format!(
        "You are a clinical decision support assistant for psychiatrists. \
You support, and never replace, the treating clinician's judgement. \
Ground every statement in the {GUIDELINE_SOURCES}, and say so when the \
evidence is weak or the presentation is ambiguous."
    )
}

/// Builder for markdown-headed prompt blocks.
///
/// Unlike a free-form prompt builder, empty content is never skipped: an
/// empty body or field value renders as [`NOT_PROVIDED`].
///
/// ```
/// use cdss::consult::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("Preamble.")
///     .fields("Patient", &[("Age", Some("34")), ("Allergies", None)])
///     .numbered("Output", "Answer with:", &["Summary", "Plan"])
///     .build();
///
/// assert!(prompt.contains("## Patient\n\n- Age: 34\n- Allergies: Not provided"));
/// assert!(prompt.contains("1. Summary\n2. Plan"));
/// ```
pub struct PromptBuilder {
    blocks: Vec<String>,
}

impl PromptBuilder {
    /// Start with a preamble paragraph (no heading).
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            blocks: vec![preamble.into()],
        }
    }

    /// A `## heading` block with free-text body.
    pub fn section(mut self, heading: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            body
        };
        self.blocks.push(format!("## {heading}\n\n{body}"));
        self
    }

    /// A `## heading` block of `- label: value` lines.
    pub fn fields(mut self, heading: &str, fields: &[(&str, Option<&str>)]) -> Self {
        let lines: Vec<String> = fields
            .iter()
            .map(|(label, value)| {
                let value = value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_PROVIDED);
                format!("- {label}: {value}")
            })
            .collect();
        self.blocks
            .push(format!("## {heading}\n\n{}", lines.join("\n")));
        self
    }

    /// A `## heading` block with an intro line and a numbered list.
    pub fn numbered(mut self, heading: &str, intro: &str, items: &[&str]) -> Self {
        let list: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect();
        self.blocks
            .push(format!("## {heading}\n\n{intro}\n\n{}", list.join("\n")));
        self
    }

    /// Join all blocks with blank lines.
    pub fn build(self) -> String {
        self.blocks.join("\n\n")
    }
}

fn presentation_fields(input: Option<&ClinicalInput>) -> [(&'static str, Option<String>); 5] {
    let symptoms = input
        .filter(|i| !i.symptoms.is_empty())
        .map(|i| i.symptoms.join(", "));
    [
        ("Symptom category", input.map(|i| i.category.label().to_string())),
        ("Symptoms", symptoms),
        ("Severity", input.map(|i| i.severity.label().to_string())),
        ("Medical history", input.and_then(|i| i.history.clone())),
        ("Current medications", input.and_then(|i| i.medications.clone())),
    ]
}

fn with_presentation(builder: PromptBuilder, input: Option<&ClinicalInput>) -> PromptBuilder {
    let owned = presentation_fields(input);
    let fields: Vec<(&str, Option<&str>)> = owned
        .iter()
        .map(|(label, value)| (*label, value.as_deref()))
        .collect();
    builder.fields("Patient Presentation", &fields)
}

/// Render the primary recommendation prompt.
///
/// Callers validate first (see
/// [`ClinicalInput::validate_for_recommendation`]); this function renders
/// whatever it is given.
pub fn compose(input: &ClinicalInput) -> String {
    let preamble = format!(
        "Assess the following psychiatric presentation. Base your assessment on the \
{GUIDELINE_SOURCES}."
    );
    with_presentation(PromptBuilder::new(preamble), Some(input))
        .numbered(
            "Requested Output",
            "Respond with exactly these six sections, in this order. Start each \
section with its label followed by a colon, and do not repeat a label elsewhere \
in your answer.",
            &SECTION_LABELS,
        )
        .build()
}

/// Render the follow-up prompt for `question`.
///
/// `context` is the last input submitted in the session, if any. Its symptom
/// list may be empty.
pub fn compose_follow_up(context: Option<&ClinicalInput>, question: &str) -> String {
    let preamble = format!(
        "Answer the psychiatrist's follow-up question about the patient below, \
taking the earlier conversation into account. Base your answer on the \
{GUIDELINE_SOURCES}, and keep it concise."
    );
    with_presentation(PromptBuilder::new(preamble), context)
        .section("Question", question.trim())
        .build()
}

/// Build the chat-style message list for a follow-up call:
/// system message, prior log entries in order, then the composed question.
pub fn follow_up_messages(
    system: &str,
    context: Option<&ClinicalInput>,
    history: &[HistoryEntry],
    question: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend(history.iter().map(HistoryEntry::to_message));
    messages.push(Message::user(compose_follow_up(context, question)));
    messages
}
