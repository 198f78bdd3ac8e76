//! Repair of raw generated text into a structured four-section note.
//!
//! Generation models return almost-JSON: fenced in markdown markers,
//! double-quote-escaped, or truncated mid-object. The cascade is an ordered
//! list of independent repair strategies; the first one that recovers a note
//! wins. Only total irrecoverability is an error — a partially recovered
//! note degrades to placeholders for the missing sections.

use crate::error::{Result, ScribeError};
use crate::soap::note::{Section, SoapNote};
use regex::{Regex, RegexBuilder};

/// One repair attempt: cleaned text in, recovered note or nothing out.
type Strategy = fn(&RepairCascade, &str) -> Option<SoapNote>;

/// Ordered repair strategies for malformed generated notes.
pub struct RepairCascade {
    fenced_block: Regex,
    fence_marker: Regex,
    key_patterns: Vec<(Section, Regex)>,
}

impl Default for RepairCascade {
    fn default() -> Self {
        Self::new()
    }
}

impl RepairCascade {
    pub fn new() -> Self {
        // Matches a fenced block and captures from the opening brace to the
        // closing fence (or end of text when the fence is never closed).
        let fenced_block = RegexBuilder::new(r"```(?:json)?\s*(\{.*?)(?:```|$)")
            .dot_matches_new_line(true)
            .build()
            .unwrap_or_else(|e| panic!("invalid fenced-block pattern: {e}"));
        let fence_marker = Regex::new(r"```(?:json)?")
            .unwrap_or_else(|e| panic!("invalid fence-marker pattern: {e}"));

        let key_patterns = Section::ALL
            .iter()
            .map(|&section| {
                let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, section.key());
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()
                    .unwrap_or_else(|e| panic!("invalid key pattern for {section}: {e}"));
                (section, regex)
            })
            .collect();

        Self {
            fenced_block,
            fence_marker,
            key_patterns,
        }
    }

    /// Run the cascade. The result always carries all four sections; any
    /// section absent from the recovered data holds the placeholder.
    pub fn repair(&self, raw: &str) -> Result<SoapNote> {
        let clean = self.preprocess(raw);

        let strategies: [(&str, Strategy); 3] = [
            ("strict-parse", Self::parse_strict),
            ("close-brace", Self::parse_reclosed),
            ("key-extraction", Self::extract_keys),
        ];

        for (_name, strategy) in strategies {
            if let Some(note) = strategy(self, &clean) {
                return Ok(note);
            }
        }

        Err(ScribeError::ParseFailure {
            message: "no strategy recovered any section content".to_string(),
        })
    }

    /// Strip fence markers and one enclosing quote pair.
    ///
    /// When the whole payload arrives double-quote-escaped (outer quotes with
    /// inner quotes doubled), both layers are undone together; well-formed
    /// JSON containing legitimate empty strings is left untouched.
    fn preprocess(&self, raw: &str) -> String {
        let clean = match self.fenced_block.captures(raw) {
            Some(caps) => caps[1].trim().to_string(),
            None => self.fence_marker.replace_all(raw, "").trim().to_string(),
        };

        if clean.len() >= 2 && clean.starts_with('"') && clean.ends_with('"') {
            clean[1..clean.len() - 1].replace("\"\"", "\"")
        } else {
            clean
        }
    }

    /// Strategy 1: the text is already a valid JSON object.
    fn parse_strict(&self, clean: &str) -> Option<SoapNote> {
        let value: serde_json::Value = serde_json::from_str(clean).ok()?;
        Self::note_from_value(&value)
    }

    /// Strategy 2: the object was truncated; a single closing brace may
    /// complete it.
    fn parse_reclosed(&self, clean: &str) -> Option<SoapNote> {
        let reclosed = format!("{clean}}}");
        let value: serde_json::Value = serde_json::from_str(&reclosed).ok()?;
        Self::note_from_value(&value)
    }

    /// Strategy 3: independent per-key extraction of the quoted value
    /// following each known key name. Succeeds when at least one section
    /// yields content.
    fn extract_keys(&self, clean: &str) -> Option<SoapNote> {
        let mut note = SoapNote::placeholder();
        let mut recovered = false;

        for (section, pattern) in &self.key_patterns {
            if let Some(caps) = pattern.captures(clean) {
                let text = caps[1].trim().to_string();
                if !text.is_empty() {
                    note.set_section(*section, text);
                    recovered = true;
                }
            }
        }

        recovered.then_some(note)
    }

    fn note_from_value(value: &serde_json::Value) -> Option<SoapNote> {
        let map = value.as_object()?;
        let mut note = SoapNote::placeholder();
        for section in Section::ALL {
            if let Some(text) = map.get(section.key()).and_then(|v| v.as_str()) {
                note.set_section(section, text.to_string());
            }
        }
        Some(note)
    }
}
