//! Structured clinical input collected from the form.
//!
//! A [`ClinicalInput`] is built fresh for every interaction and never
//! persisted past the session. Symptom categories carry their fixed symptom
//! lists so both the CLI and the web form offer the same choices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Broad symptom category selected first on the form.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymptomCategory {
    #[serde(rename = "Mood Disorders")]
    MoodDisorders,
    #[serde(rename = "Anxiety Disorders")]
    AnxietyDisorders,
    #[serde(rename = "Psychotic Disorders")]
    PsychoticDisorders,
    #[serde(rename = "Other")]
    Other,
}

impl SymptomCategory {
    /// All categories in display order.
    pub const ALL: [SymptomCategory; 4] = [
        SymptomCategory::MoodDisorders,
        SymptomCategory::AnxietyDisorders,
        SymptomCategory::PsychoticDisorders,
        SymptomCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MoodDisorders => "Mood Disorders",
            Self::AnxietyDisorders => "Anxiety Disorders",
            Self::PsychoticDisorders => "Psychotic Disorders",
            Self::Other => "Other",
        }
    }

    /// The fixed symptom list offered for this category.
    pub fn symptoms(self) -> &'static [&'static str] {
        match self {
            Self::MoodDisorders => &[
                "Persistent sadness",
                "Loss of interest",
                "Fatigue",
                "Insomnia",
                "Feelings of worthlessness",
            ],
            Self::AnxietyDisorders => &[
                "Excessive worry",
                "Restlessness",
                "Fatigue",
                "Difficulty concentrating",
                "Irritability",
            ],
            Self::PsychoticDisorders => &[
                "Hallucinations",
                "Delusions",
                "Disorganized speech",
                "Disorganized behavior",
                "Negative symptoms",
            ],
            Self::Other => &["Other symptom 1", "Other symptom 2", "Other symptom 3"],
        }
    }

    pub fn offers(self, symptom: &str) -> bool {
        self.symptoms().contains(&symptom)
    }
}

impl fmt::Display for SymptomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SymptomCategory {
    type Err = String;

    /// Accepts the display label or a short alias (`mood`, `anxiety`,
    /// `psychotic`, `other`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.label().to_lowercase() == lower
                    || c.label()
                        .split_whitespace()
                        .next()
                        .is_some_and(|w| w.to_lowercase() == lower)
            })
            .ok_or_else(|| format!("unknown symptom category: '{s}'"))
    }
}

/// Symptom severity. Ordered: `Mild < Moderate < Severe`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Severe];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.label().to_lowercase() == lower)
            .ok_or_else(|| format!("unknown severity: '{s}' (expected Mild, Moderate or Severe)"))
    }
}

/// Everything the clinician entered for one request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClinicalInput {
    pub category: SymptomCategory,
    /// Selected symptoms in selection order, without duplicates.
    #[serde(default, deserialize_with = "normalized_symptoms")]
    pub symptoms: Vec<String>,
    pub severity: Severity,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub history: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub medications: Option<String>,
}

impl ClinicalInput {
    pub fn new(category: SymptomCategory, severity: Severity) -> Self {
        Self {
            category,
            symptoms: Vec::new(),
            severity,
            history: None,
            medications: None,
        }
    }

    /// Add symptoms, skipping ones already selected.
    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_symptoms(&mut self.symptoms, symptoms);
        self
    }

    /// Set the medical history. Blank text means "not provided".
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = non_blank(history.into());
        self
    }

    /// Set the current medication list. Blank text means "not provided".
    pub fn with_medications(mut self, medications: impl Into<String>) -> Self {
        self.medications = non_blank(medications.into());
        self
    }

    /// Check the input is fit for the primary recommendation prompt.
    ///
    /// Requires at least one symptom, each drawn from the category's list.
    pub fn validate_for_recommendation(&self) -> Result<(), ValidationError> {
        if self.symptoms.is_empty() {
            return Err(ValidationError::NoSymptoms);
        }
        if let Some(unknown) = self.symptoms.iter().find(|s| !self.category.offers(s)) {
            return Err(ValidationError::UnknownSymptom {
                symptom: unknown.clone(),
                category: self.category.label().to_string(),
            });
        }
        Ok(())
    }
}

/// Trim each symptom, skip blanks, and keep only the first of any repeat.
fn push_symptoms<I, S>(selected: &mut Vec<String>, symptoms: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for s in symptoms {
        let s = s.into().trim().to_string();
        if !s.is_empty() && !selected.contains(&s) {
            selected.push(s);
        }
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(non_blank))
}

fn normalized_symptoms<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    let mut selected = Vec::with_capacity(raw.len());
    push_symptoms(&mut selected, raw);
    Ok(selected)
}
