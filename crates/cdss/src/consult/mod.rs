//! Consultation core.
//!
//! - [`prompt`] renders clinical input into prompt text.
//! - [`sections`] splits a reply into labeled sections.
//! - [`log`] and [`session`] hold the conversation.
//! - [`consultant`] runs the recommendation and follow-up flows against a
//!   [`ChatBackend`](crate::ChatBackend).

pub mod config;
pub mod consultant;
pub mod log;
pub mod prompt;
pub mod recommendation;
pub mod sections;
pub mod session;

pub use config::ConsultConfig;
pub use consultant::Consultant;
pub use log::{ConversationLog, HistoryEntry, Role};
pub use prompt::{NOT_PROVIDED, SECTION_LABELS, compose, compose_follow_up};
pub use recommendation::Recommendation;
pub use sections::{Boundary, Extraction, NO_INFORMATION, Section, sectionize, sectionize_with};
pub use session::Session;
