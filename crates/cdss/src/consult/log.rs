//! Append-only conversation log.
//!
//! Entries are kept in arrival order and never edited or removed. The log is
//! a plain value; whoever owns the [`Session`](super::session::Session)
//! owns the log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Message;

/// Who authored an entry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Ai,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => f.write_str("Doctor"),
            Role::Ai => f.write_str("AI"),
        }
    }
}

/// One message in the log.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn doctor(text: impl Into<String>) -> Self {
        Self::new(Role::Doctor, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Role::Ai, text)
    }

    /// Chat message for replaying this entry to the model.
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::Doctor => Message::user(self.text.clone()),
            Role::Ai => Message::assistant(self.text.clone()),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.text)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ConversationLog {
    entries: Vec<HistoryEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Append a question and its answer back to back.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.entries.push(HistoryEntry::doctor(question));
        self.entries.push(HistoryEntry::ai(answer));
    }

    /// All entries, oldest first.
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Owned copy of the current entries.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.entries.iter().map(HistoryEntry::to_message).collect()
    }
}
