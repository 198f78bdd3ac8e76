//! Per-section classification rules and local validation heuristics.
//!
//! The rule texts state strict inclusion and exclusion criteria per section.
//! They are not executed as code: they travel verbatim inside every verifier
//! oracle query as the section's placement contract. The heuristic checks run
//! locally without any oracle call and only ever produce advisory warnings —
//! they never remove content themselves.

use crate::defaults;
use crate::soap::note::{Section, SoapNote};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Inclusion/exclusion criteria handed to the oracle for one section.
pub fn rule_text(section: Section) -> &'static str {
    match section {
        Section::Subjective => {
            "patient-reported symptoms, history, complaints, and concerns described in the \
             patient's own words. Includes: symptom onset, duration, severity ratings, \
             positional effects, sleep disruption, failed self-treatments, adverse reactions \
             to medications, and sensations (e.g. 'choking feeling', 'bowling ball sensation'). \
             DOES NOT INCLUDE: clinician-measured findings or diagnostic test results."
        }
        Section::Objective => {
            "ONLY findings directly observed or measured by the clinician during this encounter: \
             physical exam findings, vital signs taken in-office, and test results already \
             available. MUST NOT INCLUDE: (a) patient self-reports or home measurements \
             presented as clinical findings, (b) symptoms the patient described — those belong \
             in Subjective, (c) planned exam steps not yet performed, (d) any information from \
             before this encounter unless re-confirmed by the clinician today. If the physical \
             exam had not yet been performed at the time of the dialogue, the only acceptable \
             Objective content is 'Physical examination pending' or equivalent."
        }
        Section::Assessment => {
            "the clinician's diagnostic impression or differential diagnosis, synthesized from \
             the subjective and objective findings. Must reflect what the clinician expressed \
             during the encounter, not inferred standard-of-care conclusions."
        }
        Section::Plan => {
            "ONLY treatments, medications, referrals, diagnostics, or follow-up steps that were \
             explicitly discussed or ordered by the clinician during this specific encounter. \
             MUST NOT INCLUDE actions that represent standard-of-care defaults not mentioned in \
             the dialogue (e.g. ENT referrals, hydration advice, antibiotic prescriptions, chest \
             X-rays, or follow-up scheduling unless the clinician explicitly mentioned them). If \
             a plan element cannot be traced to a direct statement in the transcript, it is a \
             hallucination."
        }
    }
}

/// Category of an advisory validation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    LongPlan,
    BoilerplatePhrases,
    ObjectiveNoMeasurements,
    IncompleteEncounter,
}

/// Advisory diagnostic attached to a run's output for downstream review.
/// Never blocks or alters the note.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub detail: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

/// Local heuristic checks over a repaired note and its source transcript.
pub struct RulesEngine {
    measurement: Regex,
    boilerplate: Regex,
    exam_language: Regex,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine {
    pub fn new() -> Self {
        let measurement = RegexBuilder::new(
            r"\b(\d+[./]\d+|\d+\s*(?:bpm|mmhg|°|degrees?|kg|lbs?|cm|%|breaths?/min|rpm))\b",
        )
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid measurement pattern: {e}"));

        let boilerplate = RegexBuilder::new(
            r"\bENT referral\b|\brefer(?:ral)? to\b|\bhydrat(?:ion|e)\b|\brest\b|\bchest\s*x.?ray\b|\bbronchodilator\b|\bantibiotic\b|\bfollow.up\b|\bschedul\w+\b",
        )
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid boilerplate pattern: {e}"));

        let exam_language = RegexBuilder::new(
            r"\b(exam(?:in(?:e|ation))?|auscult|palpat|percuss|inspect|vital|listen(?:ing)?|look(?:ing)?\s+at)\b",
        )
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid exam-language pattern: {e}"));

        Self {
            measurement,
            boilerplate,
            exam_language,
        }
    }

    /// Whether the text contains a concrete numeric measurement
    /// (vitals-style number or number-with-unit).
    pub fn has_measurement(&self, text: &str) -> bool {
        self.measurement.is_match(text)
    }

    /// Run every heuristic over the note. Warnings are diagnostic signal
    /// only; the note is returned to the caller untouched.
    pub fn validate(&self, note: &SoapNote, transcript: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let plan = &note.plan;
        if !SoapNote::is_placeholder(plan) {
            let plan_words = plan.split_whitespace().count();
            if plan_words > defaults::PLAN_WORD_LIMIT {
                warnings.push(ValidationWarning {
                    kind: WarningKind::LongPlan,
                    detail: format!(
                        "LONG_PLAN ({plan_words} words): high risk of boilerplate fabrication"
                    ),
                });
            }

            let hits = self.boilerplate_hits(plan);
            if !hits.is_empty() {
                warnings.push(ValidationWarning {
                    kind: WarningKind::BoilerplatePhrases,
                    detail: format!("BOILERPLATE_PHRASES in Plan: {}", hits.join(", ")),
                });
            }
        }

        let objective = &note.objective;
        if !SoapNote::is_placeholder(objective) {
            if !self.has_measurement(objective) {
                warnings.push(ValidationWarning {
                    kind: WarningKind::ObjectiveNoMeasurements,
                    detail: "OBJECTIVE_NO_MEASUREMENTS: Objective section lacks concrete clinical measurements"
                        .to_string(),
                });
            }

            if !self.exam_language.is_match(transcript) {
                warnings.push(ValidationWarning {
                    kind: WarningKind::IncompleteEncounter,
                    detail: "INCOMPLETE_ENCOUNTER: No exam language found in transcript but Objective section is non-empty"
                        .to_string(),
                });
            }
        }

        warnings
    }

    /// Lowercased boilerplate matches, deduplicated in first-seen order.
    fn boilerplate_hits(&self, plan: &str) -> Vec<String> {
        let mut hits: Vec<String> = Vec::new();
        for found in self.boilerplate.find_iter(plan) {
            let hit = found.as_str().to_lowercase();
            if !hits.contains(&hit) {
                hits.push(hit);
            }
        }
        hits
    }
}
