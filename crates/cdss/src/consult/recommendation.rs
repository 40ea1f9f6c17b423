//! A recommendation reply and its sectioned view.

use serde::Serialize;

use crate::consult::sections::{Boundary, Section, sectionize_with};

/// Raw reply text for one recommendation, plus the labels used to split it.
///
/// Sections are recomputed from the text on every call to
/// [`sections`](Self::sections); the text is the only stored state.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    text: String,
    #[serde(skip)]
    labels: Vec<String>,
    #[serde(skip)]
    boundary: Boundary,
}

impl Recommendation {
    pub fn new(text: impl Into<String>, labels: Vec<String>, boundary: Boundary) -> Self {
        Self {
            text: text.into(),
            labels,
            boundary,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn sections(&self) -> Vec<Section> {
        sectionize_with(&self.text, &self.labels, self.boundary)
    }

    /// Whether at least one requested section was found in the reply.
    pub fn has_sections(&self) -> bool {
        self.sections().iter().any(|s| s.extraction.is_found())
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
