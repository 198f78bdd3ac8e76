//! Per-claim verification against the source transcript.
//!
//! Each substantive claim is sent to the verifier oracle together with the
//! full transcript and the section's rule text. The oracle's reply resolves
//! to exactly one of two verdicts; pruning keeps survivors in original order
//! and never rewrites their text.

use crate::defaults;
use crate::engines::llm::TextGenerator;
use crate::error::Result;
use crate::soap::note::{Section, SectionQuotes, SoapNote};
use crate::soap::prompt;
use crate::soap::segment::{Claim, ClaimSegmenter};
use regex::{Regex, RegexBuilder};

/// Verdict on a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictKind {
    Keep,
    Hallucination,
}

/// Resolution for oracle responses carrying neither verdict token.
///
/// Keeping on ambiguity is a deliberate recall-over-precision policy: a
/// malformed oracle reply must never silently delete note content.
pub const AMBIGUOUS_VERDICT: VerdictKind = VerdictKind::Keep;

/// Outcome of verifying one claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub claim: Claim,
    pub kind: VerdictKind,
    pub reason: String,
    pub evidence_quote: String,
}

/// Result of pruning one section.
#[derive(Debug, Clone)]
pub struct PrunedSection {
    /// Surviving claims joined with single spaces, or the placeholder when
    /// nothing survived.
    pub text: String,
    /// Supporting transcript quotes for kept claims.
    pub quotes: Vec<String>,
    pub verdicts: Vec<Verdict>,
}

/// Per-claim progress callback, e.g. for streaming `[keep]`/`[drop]` lines.
pub type ProgressFn<'a> = dyn Fn(&str) + 'a;

/// Verification state machine driving the oracle per claim.
pub struct ClaimVerifier<'a> {
    oracle: &'a dyn TextGenerator,
    segmenter: ClaimSegmenter,
    max_tokens: usize,
    reason_line: Regex,
    quote_line: Regex,
}

impl<'a> ClaimVerifier<'a> {
    pub fn new(oracle: &'a dyn TextGenerator) -> Self {
        let reason_line = RegexBuilder::new(r"Reason:\s*(.+)")
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("invalid reason pattern: {e}"));
        let quote_line = RegexBuilder::new(r"Quote:\s*(.+)")
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("invalid quote pattern: {e}"));
        Self {
            oracle,
            segmenter: ClaimSegmenter::new(),
            max_tokens: defaults::VERIFY_MAX_TOKENS,
            reason_line,
            quote_line,
        }
    }

    /// Override the oracle token budget per query.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Resolve a raw oracle response to a verdict.
    ///
    /// Exact token policy, not probabilistic: `HALLUCINATION` anywhere wins,
    /// then `YES`; anything else falls back to [`AMBIGUOUS_VERDICT`].
    pub fn resolve(response: &str) -> VerdictKind {
        let upper = response.to_uppercase();
        if upper.contains("HALLUCINATION") {
            VerdictKind::Hallucination
        } else if upper.contains("YES") {
            VerdictKind::Keep
        } else {
            AMBIGUOUS_VERDICT
        }
    }

    /// Query the oracle about one claim and resolve its reply.
    pub fn verify(&self, transcript: &str, claim: &Claim) -> Result<Verdict> {
        let query = prompt::verification_prompt(transcript, claim.section, &claim.text);
        let response = self.oracle.generate(&query, self.max_tokens)?;

        let kind = Self::resolve(&response);
        let reason = self
            .reason_line
            .captures(&response)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();
        let evidence_quote = self
            .quote_line
            .captures(&response)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();

        Ok(Verdict {
            claim: claim.clone(),
            kind,
            reason,
            evidence_quote,
        })
    }

    /// Segment one section, verify each substantive claim, and rebuild the
    /// section from the survivors. Zero survivors revert the section to the
    /// placeholder regardless of original content.
    pub fn prune_section(
        &self,
        transcript: &str,
        section: Section,
        content: &str,
        progress: &ProgressFn<'_>,
    ) -> Result<PrunedSection> {
        let mut survivors: Vec<String> = Vec::new();
        let mut quotes: Vec<String> = Vec::new();
        let mut verdicts: Vec<Verdict> = Vec::new();

        for claim in self.segmenter.segment(section, content) {
            if !claim.substantive {
                progress(&format!("[skip] {} (too short to verify)", claim.text));
                survivors.push(claim.text);
                continue;
            }

            let verdict = self.verify(transcript, &claim)?;
            match verdict.kind {
                VerdictKind::Keep => {
                    progress(&format!("[keep] {}", claim.text));
                    if let Some(quote) = usable_quote(&verdict.evidence_quote) {
                        quotes.push(quote.to_string());
                    }
                    survivors.push(claim.text);
                }
                VerdictKind::Hallucination => {
                    if verdict.reason.is_empty() {
                        progress(&format!("[drop] {}", claim.text));
                    } else {
                        progress(&format!("[drop] {} ({})", claim.text, verdict.reason));
                    }
                }
            }
            verdicts.push(verdict);
        }

        let text = if survivors.is_empty() {
            defaults::PLACEHOLDER.to_string()
        } else {
            survivors.join(" ")
        };

        Ok(PrunedSection {
            text,
            quotes,
            verdicts,
        })
    }

    /// Prune every non-placeholder section of a repaired note.
    pub fn prune_note(
        &self,
        transcript: &str,
        note: &SoapNote,
        progress: &ProgressFn<'_>,
    ) -> Result<(SoapNote, SectionQuotes)> {
        let mut pruned = SoapNote::placeholder();
        let mut quotes = SectionQuotes::default();

        for section in Section::ALL {
            let content = note.section(section);
            if SoapNote::is_placeholder(content) {
                continue;
            }

            progress(&format!("[{}]", section.display_name()));
            let result = self.prune_section(transcript, section, content, progress)?;
            if result.text == defaults::PLACEHOLDER {
                progress(&format!(
                    "[{}] nothing survived verification, section dropped",
                    section.display_name()
                ));
            }
            *quotes.section_mut(section) = result.quotes;
            pruned.set_section(section, result.text);
        }

        Ok((pruned, quotes))
    }
}

/// A quote line worth surfacing in the final artifact: non-empty and not the
/// oracle's literal "None" marker for hallucinations.
fn usable_quote(quote: &str) -> Option<&str> {
    let trimmed = quote.trim().trim_matches('"');
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed)
    }
}
