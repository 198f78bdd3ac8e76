//! Splitting section text into atomic, ordered, deduplicated claims.

use crate::defaults;
use crate::soap::note::Section;
use regex::Regex;

/// One sentence-level assertion extracted from a note section.
///
/// The text is verbatim — never rewritten by segmentation or verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub section: Section,
    pub text: String,
    pub order_index: usize,
    /// Claims under the minimum word count pass through unverified.
    pub substantive: bool,
}

/// Splits bullet/numbered list text into ordered, deduplicated claims.
pub struct ClaimSegmenter {
    bullet_marker: Regex,
    number_marker: Regex,
}

impl Default for ClaimSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimSegmenter {
    pub fn new() -> Self {
        let bullet_marker = Regex::new(r"\n\s*[-•]\s*")
            .unwrap_or_else(|e| panic!("invalid bullet pattern: {e}"));
        let number_marker = Regex::new(r"\n\s*\d+\.\s*")
            .unwrap_or_else(|e| panic!("invalid numbering pattern: {e}"));
        Self {
            bullet_marker,
            number_marker,
        }
    }

    /// Segment one section's text into claims: list markers normalized into
    /// sentence boundaries, split on sentence-final punctuation and
    /// semicolons, duplicates removed in first-seen order.
    pub fn segment(&self, section: Section, text: &str) -> Vec<Claim> {
        let normalized = self.normalize_list_markers(text);

        let mut claims = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for sentence in split_sentences(&normalized) {
            let sentence = sentence.trim().trim_end_matches(';').trim().to_string();
            if sentence.is_empty() || seen.contains(&sentence) {
                continue;
            }
            seen.push(sentence.clone());

            let substantive = sentence.split_whitespace().count() >= defaults::MIN_CLAIM_WORDS;
            claims.push(Claim {
                section,
                text: sentence,
                order_index: claims.len(),
                substantive,
            });
        }

        claims
    }

    /// Turn bullet and numbered-list markers into sentence boundaries.
    fn normalize_list_markers(&self, text: &str) -> String {
        let text = self.bullet_marker.replace_all(text, ". ");
        self.number_marker.replace_all(&text, ". ").into_owned()
    }
}

/// Split after sentence-final punctuation followed by whitespace, and on
/// semicolons. Decimal numbers ("38.5") never split because the period is
/// not followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ';' {
            parts.push(std::mem::take(&mut current));
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            continue;
        }

        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            parts.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
