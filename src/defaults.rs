//! Default configuration constants for clinscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Audio sample rate (Hz) the transcoder normalizes to.
///
/// 16kHz mono is the standard input for speech recognition engines.
pub const SAMPLE_RATE: u32 = 16000;

/// Fixed placeholder for a SOAP section with no verifiable content.
pub const PLACEHOLDER: &str = "Not discussed.";

/// Word count above which a plan section is flagged as boilerplate risk.
pub const PLAN_WORD_LIMIT: usize = 60;

/// Minimum word count for a claim to be worth verifying.
///
/// Shorter claims pass through unverified — too short to meaningfully check.
pub const MIN_CLAIM_WORDS: usize = 2;

/// Token budget for the generation model when drafting the note.
pub const GENERATION_MAX_TOKENS: usize = 1024;

/// Token budget for a single verifier oracle query.
pub const VERIFY_MAX_TOKENS: usize = 160;

/// Capacity of the bounded channel between a stage worker and the dispatcher.
pub const EVENT_BUFFER: usize = 64;

/// Capacity of the bounded channel carrying run events to the caller.
pub const RUN_BUFFER: usize = 64;

/// Diarization speaker bounds — encounters are exactly doctor plus patient.
pub const MIN_SPEAKERS: usize = 2;
pub const MAX_SPEAKERS: usize = 2;

/// Raw diarization label assigned to the first detected speaker.
pub const FIRST_SPEAKER_LABEL: &str = "SPEAKER_00";

/// Raw diarization label assigned to the second detected speaker.
pub const SECOND_SPEAKER_LABEL: &str = "SPEAKER_01";

/// External transcoder binary.
pub const TRANSCODER_BIN: &str = "ffmpeg";

/// Fixed name of the normalized audio artifact inside the work directory.
pub const NORMALIZED_AUDIO_FILE: &str = "converted_audio.wav";

/// Fixed name of the detailed transcript artifact (JSON).
pub const TRANSCRIPT_JSON_FILE: &str = "transcript.json";

/// Fixed name of the readable dialogue artifact (plain text).
pub const DIALOGUE_TEXT_FILE: &str = "formatted_dialogue.txt";

/// Fixed name of the repaired draft note artifact (pre-verification).
pub const DRAFT_NOTE_FILE: &str = "draft_soap.json";

/// Fixed name of the final pruned note artifact.
pub const FINAL_NOTE_FILE: &str = "final_soap_summary.json";
