//! Data types for the four-section SOAP note.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// The four canonical note sections, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Subjective,
    Objective,
    Assessment,
    Plan,
}

impl Section {
    /// All sections in canonical order.
    pub const ALL: [Section; 4] = [
        Section::Subjective,
        Section::Objective,
        Section::Assessment,
        Section::Plan,
    ];

    /// Lowercase JSON key for this section.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Subjective => "subjective",
            Section::Objective => "objective",
            Section::Assessment => "assessment",
            Section::Plan => "plan",
        }
    }

    /// Capitalized name used in prompts and progress output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Section::Subjective => "Subjective",
            Section::Objective => "Objective",
            Section::Assessment => "Assessment",
            Section::Plan => "Plan",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A structured SOAP note. The key set is always complete: a section with
/// no content holds the placeholder, never an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapNote {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

impl Default for SoapNote {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl SoapNote {
    /// A note with every section set to the placeholder.
    pub fn placeholder() -> Self {
        Self {
            subjective: defaults::PLACEHOLDER.to_string(),
            objective: defaults::PLACEHOLDER.to_string(),
            assessment: defaults::PLACEHOLDER.to_string(),
            plan: defaults::PLACEHOLDER.to_string(),
        }
    }

    /// Borrow the text of one section.
    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Subjective => &self.subjective,
            Section::Objective => &self.objective,
            Section::Assessment => &self.assessment,
            Section::Plan => &self.plan,
        }
    }

    /// Replace the text of one section. Blank text falls back to the
    /// placeholder so the complete-key invariant holds.
    pub fn set_section(&mut self, section: Section, text: String) {
        let text = if text.trim().is_empty() {
            defaults::PLACEHOLDER.to_string()
        } else {
            text
        };
        match section {
            Section::Subjective => self.subjective = text,
            Section::Objective => self.objective = text,
            Section::Assessment => self.assessment = text,
            Section::Plan => self.plan = text,
        }
    }

    /// Whether the given text counts as "no content" for a section.
    ///
    /// Generation models emit several spellings of emptiness; all of them
    /// are treated as the placeholder.
    pub fn is_placeholder(text: &str) -> bool {
        matches!(
            text.trim().to_lowercase().as_str(),
            "not discussed." | "not discussed" | "none" | "n/a" | "not applicable" | "not mentioned" | ""
        )
    }
}

/// Supporting transcript quotes for the kept claims of each section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionQuotes {
    pub subjective: Vec<String>,
    pub objective: Vec<String>,
    pub assessment: Vec<String>,
    pub plan: Vec<String>,
}

impl SectionQuotes {
    /// Mutable access to one section's quote list.
    pub fn section_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Subjective => &mut self.subjective,
            Section::Objective => &mut self.objective,
            Section::Assessment => &mut self.assessment,
            Section::Plan => &mut self.plan,
        }
    }

    /// Borrow one section's quote list.
    pub fn section(&self, section: Section) -> &[String] {
        match section {
            Section::Subjective => &self.subjective,
            Section::Objective => &self.objective,
            Section::Assessment => &self.assessment,
            Section::Plan => &self.plan,
        }
    }
}
