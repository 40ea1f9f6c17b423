//! Splitting a free-text reply into labeled sections.
//!
//! Matching is a plain, case-sensitive substring search for each label's
//! first occurrence. A span ends at the nearest following occurrence of any
//! known label ([`Boundary::NextLabel`]) or at the next line break
//! ([`Boundary::LineBreak`]). A label that appears by coincidence inside
//! another section's text (for example a differential list mentioning
//! "ICD-11 Code") truncates that section early. That is a known limitation
//! of substring matching, not something this module tries to repair.
//!
//! Extraction never fails: an absent label yields [`Extraction::Missing`].

use serde::Serialize;

/// Placeholder displayed for a section the reply did not contain.
pub const NO_INFORMATION: &str = "No information available.";

/// Result of looking up one label.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Extraction {
    Found(String),
    Missing,
}

impl Extraction {
    /// Display text: the span, or [`NO_INFORMATION`].
    pub fn text(&self) -> &str {
        match self {
            Extraction::Found(text) => text,
            Extraction::Missing => NO_INFORMATION,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }
}

/// A label paired with what was extracted for it.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub extraction: Extraction,
}

impl Section {
    pub fn text(&self) -> &str {
        self.extraction.text()
    }
}

/// Where a section's span stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Boundary {
    /// Nearest later occurrence of any known label, else end of text.
    #[default]
    NextLabel,
    /// First line break after the span's content starts.
    LineBreak,
}

/// Split `text` by `labels` using [`Boundary::NextLabel`].
///
/// ```
/// use cdss::consult::sections::{Extraction, sectionize};
///
/// let reply = "Likely Diagnosis: X\nDifferential Diagnoses: Y";
/// let sections = sectionize(reply, &["Likely Diagnosis", "Differential Diagnoses", "ICD-11 Code"]);
///
/// assert_eq!(sections[0].extraction, Extraction::Found("X".into()));
/// assert_eq!(sections[1].extraction, Extraction::Found("Y".into()));
/// assert_eq!(sections[2].text(), "No information available.");
/// ```
pub fn sectionize<S: AsRef<str>>(text: &str, labels: &[S]) -> Vec<Section> {
    sectionize_with(text, labels, Boundary::NextLabel)
}

/// Split `text` by `labels` with an explicit boundary rule.
///
/// Output follows `labels` order, not order of appearance in `text`.
pub fn sectionize_with<S: AsRef<str>>(text: &str, labels: &[S], boundary: Boundary) -> Vec<Section> {
    labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            Section {
                label: label.to_string(),
                extraction: extract(text, label, labels, boundary),
            }
        })
        .collect()
}

fn extract<S: AsRef<str>>(text: &str, label: &str, labels: &[S], boundary: Boundary) -> Extraction {
    if label.is_empty() {
        return Extraction::Missing;
    }
    let Some(start) = text.find(label) else {
        return Extraction::Missing;
    };
    let rest = text.get(start + label.len()..).unwrap_or("");

    let end = match boundary {
        Boundary::NextLabel => labels
            .iter()
            .map(AsRef::as_ref)
            .filter(|l| !l.is_empty())
            .filter_map(|l| rest.find(l))
            .min()
            .unwrap_or(rest.len()),
        Boundary::LineBreak => {
            let lead = rest.len() - rest.trim_start_matches(is_leading_noise).len();
            let body = rest.get(lead..).unwrap_or("");
            body.find('\n').map_or(rest.len(), |pos| lead + pos)
        }
    };

    let cleaned = clean(rest.get(..end).unwrap_or(""));
    if cleaned.is_empty() {
        Extraction::Missing
    } else {
        Extraction::Found(cleaned.to_string())
    }
}

/// Separator noise between a label and its content (`:`, bold markers).
fn is_leading_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '*' | '_')
}

fn is_trailing_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '*' | '#' | '_')
}

/// A line holding only a list marker that belongs to the next section,
/// e.g. `2.`, `3)`, `-`, `###`.
fn is_dangling_marker(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    if line.chars().all(|c| matches!(c, '-' | '*' | '#' | '•')) {
        return true;
    }
    match line.strip_suffix('.').or_else(|| line.strip_suffix(')')) {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn clean(span: &str) -> &str {
    let mut s = span.trim_start_matches(is_leading_noise);
    loop {
        let trimmed = s.trim_end_matches(is_trailing_noise);
        let trimmed = match trimmed.rfind('\n') {
            Some(i) if is_dangling_marker(trimmed.get(i + 1..).unwrap_or("")) => {
                trimmed.get(..i).unwrap_or("")
            }
            None if is_dangling_marker(trimmed) => "",
            _ => trimmed,
        };
        if trimmed.len() == s.len() {
            return s;
        }
        s = trimmed;
    }
}
