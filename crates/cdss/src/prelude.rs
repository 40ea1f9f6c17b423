//! Convenience re-exports for common `cdss` types.
//!
//! ```ignore
//! use cdss::prelude::*;
//! ```
//!
//! Covers the input model, the consultant and its session, the sectioned
//! reply, settings, and the error types. Prompt builder internals and the
//! retry plumbing are left out; import those from their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatBackend, ChatRequest, FnBackend, Message, MessageRole, OpenAiClient};

// ── Input ───────────────────────────────────────────────────────────
pub use crate::clinical::{ClinicalInput, Severity, SymptomCategory};

// ── Consultation ────────────────────────────────────────────────────
pub use crate::consult::{
    Boundary, ConsultConfig, Consultant, ConversationLog, Extraction, HistoryEntry,
    NO_INFORMATION, NOT_PROVIDED, Recommendation, Role, SECTION_LABELS, Section, Session,
    sectionize,
};

// ── Settings and errors ─────────────────────────────────────────────
pub use crate::config::{LlmSettings, Settings};
pub use crate::error::{ConfigurationError, ConsultError, ExternalCallError, ValidationError};
