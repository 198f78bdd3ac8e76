//! Transcript data model and its on-disk artifacts.
//!
//! A transcript is produced once by the transcription stage and read-only
//! thereafter. Two artifacts are written per run: a detailed JSON segment
//! list for callers and a plain-text dialogue for the generation prompt.

use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed speaker roles for the two-party encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    Doctor,
    Patient,
    Unknown,
}

impl SpeakerRole {
    /// Map a raw diarization label to a role.
    pub fn from_diarization_label(label: &str) -> Self {
        match label {
            defaults::FIRST_SPEAKER_LABEL => SpeakerRole::Doctor,
            defaults::SECOND_SPEAKER_LABEL => SpeakerRole::Patient,
            _ => SpeakerRole::Unknown,
        }
    }

    /// Readable label used in artifacts.
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerRole::Doctor => "Doctor",
            SpeakerRole::Patient => "Patient",
            SpeakerRole::Unknown => "Unknown",
        }
    }
}

/// One time-aligned, speaker-attributed utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker_label: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// The full transcript of one encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub utterances: Vec<Utterance>,
    pub language: String,
}

impl Transcript {
    pub fn new(utterances: Vec<Utterance>, language: impl Into<String>) -> Self {
        Self {
            utterances,
            language: language.into(),
        }
    }

    /// Readable dialogue: one `"Role: text"` line per utterance.
    pub fn dialogue_text(&self) -> String {
        self.utterances
            .iter()
            .map(|u| format!("{}: {}", u.speaker_label, u.text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize the detailed segment list.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.utterances)
            .map_err(|e| crate::error::ScribeError::Other(e.to_string()))
    }

    /// Write both per-run artifacts.
    pub fn write_artifacts(&self, json_path: &Path, text_path: &Path) -> Result<()> {
        std::fs::write(json_path, self.to_json()?)?;
        std::fs::write(text_path, self.dialogue_text())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(label: &str, text: &str, start: f64, end: f64) -> Utterance {
        Utterance {
            speaker_label: label.to_string(),
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_role_mapping_from_diarization_labels() {
        assert_eq!(
            SpeakerRole::from_diarization_label("SPEAKER_00"),
            SpeakerRole::Doctor
        );
        assert_eq!(
            SpeakerRole::from_diarization_label("SPEAKER_01"),
            SpeakerRole::Patient
        );
        assert_eq!(
            SpeakerRole::from_diarization_label("SPEAKER_02"),
            SpeakerRole::Unknown
        );
        assert_eq!(
            SpeakerRole::from_diarization_label(""),
            SpeakerRole::Unknown
        );
    }

    #[test]
    fn test_dialogue_text_formats_one_line_per_utterance() {
        let transcript = Transcript::new(
            vec![
                utterance("Doctor", "How are you feeling today?", 0.0, 2.1),
                utterance("Patient", " I've had a cough for three days. ", 2.4, 5.0),
            ],
            "en",
        );
        assert_eq!(
            transcript.dialogue_text(),
            "Doctor: How are you feeling today?\nPatient: I've had a cough for three days."
        );
    }

    #[test]
    fn test_json_artifact_shape() {
        let transcript = Transcript::new(vec![utterance("Doctor", "Hello.", 0.0, 0.8)], "en");
        let json = transcript.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value[0];
        assert_eq!(first["speaker_label"], "Doctor");
        assert_eq!(first["text"], "Hello.");
        assert_eq!(first["start"], 0.0);
        assert_eq!(first["end"], 0.8);
    }

    #[test]
    fn test_write_artifacts_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("transcript.json");
        let text_path = dir.path().join("formatted_dialogue.txt");

        let transcript = Transcript::new(
            vec![
                utterance("Doctor", "Any fever?", 0.0, 1.0),
                utterance("Patient", "Yes, last night.", 1.2, 2.5),
            ],
            "en",
        );
        transcript.write_artifacts(&json_path, &text_path).unwrap();

        let text = std::fs::read_to_string(&text_path).unwrap();
        assert_eq!(text, "Doctor: Any fever?\nPatient: Yes, last night.");

        let restored: Vec<Utterance> =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(restored, transcript.utterances);
    }

    #[test]
    fn test_empty_transcript_dialogue_is_empty() {
        let transcript = Transcript::new(vec![], "en");
        assert_eq!(transcript.dialogue_text(), "");
    }
}
