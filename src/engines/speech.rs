//! Speech engine seams: transcription, forced alignment, diarization.
//!
//! These traits allow swapping implementations (real engines vs mocks). The
//! engines themselves are external collaborators; this crate only speaks
//! their request/response contracts.

use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::transcript::{SpeakerRole, Transcript, Utterance};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One raw transcription segment before speaker attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Speech engine output: timestamped segments plus a detected language tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTranscription {
    pub segments: Vec<RawSegment>,
    pub language: String,
}

/// A speaker-labeled time span from the diarization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSpan {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
}

/// Trait for speech-to-text transcription of a normalized audio file.
pub trait SpeechEngine: Send + Sync {
    /// Transcribe normalized 16kHz mono audio into timestamped segments.
    fn transcribe(&self, audio: &Path) -> Result<RawTranscription>;

    /// Load model assets into memory ahead of the first request.
    fn preload(&self) -> Result<()> {
        Ok(())
    }

    /// Check if the engine is ready
    fn is_ready(&self) -> bool;
}

/// Trait for word-level timestamp refinement.
pub trait Aligner: Send + Sync {
    /// Refine segment timestamps against the audio for the detected language.
    fn align(&self, transcription: RawTranscription, audio: &Path) -> Result<RawTranscription>;
}

/// Trait for speaker diarization.
pub trait Diarizer: Send + Sync {
    /// Produce speaker-labeled time spans, bounded to the fixed two roles.
    fn diarize(
        &self,
        audio: &Path,
        min_speakers: usize,
        max_speakers: usize,
    ) -> Result<Vec<SpeakerSpan>>;

    /// Load model assets into memory ahead of the first request.
    fn preload(&self) -> Result<()> {
        Ok(())
    }
}

/// Attribute each segment to the speaker span with the largest temporal
/// overlap, then map raw labels onto the fixed roles.
pub fn assign_speakers(transcription: RawTranscription, spans: &[SpeakerSpan]) -> Transcript {
    let utterances = transcription
        .segments
        .into_iter()
        .map(|segment| {
            let label = dominant_speaker(&segment, spans)
                .map(SpeakerRole::from_diarization_label)
                .unwrap_or(SpeakerRole::Unknown)
                .label()
                .to_string();
            Utterance {
                speaker_label: label,
                text: segment.text.trim().to_string(),
                start: segment.start,
                end: segment.end,
            }
        })
        .collect();

    Transcript::new(utterances, transcription.language)
}

fn dominant_speaker<'a>(segment: &RawSegment, spans: &'a [SpeakerSpan]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for span in spans {
        let overlap = (segment.end.min(span.end) - segment.start.max(span.start)).max(0.0);
        if overlap > 0.0 && best.is_none_or(|(_, b)| overlap > b) {
            best = Some((&span.speaker, overlap));
        }
    }
    best.map(|(speaker, _)| speaker)
}

/// An aligner that keeps the engine's segment timestamps untouched, for
/// deployments whose speech engine already emits aligned output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAligner;

impl Aligner for PassthroughAligner {
    fn align(&self, transcription: RawTranscription, _audio: &Path) -> Result<RawTranscription> {
        Ok(transcription)
    }
}

/// Mock speech engine for testing
#[derive(Debug, Clone)]
pub struct MockSpeechEngine {
    transcription: RawTranscription,
    should_fail: bool,
}

impl Default for MockSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self {
            transcription: RawTranscription {
                segments: vec![RawSegment {
                    text: "mock segment".to_string(),
                    start: 0.0,
                    end: 1.0,
                }],
                language: "en".to_string(),
            },
            should_fail: false,
        }
    }

    /// Configure the mock to return specific segments.
    pub fn with_segments(mut self, segments: Vec<RawSegment>) -> Self {
        self.transcription.segments = segments;
        self
    }

    /// Configure the detected language tag.
    pub fn with_language(mut self, language: &str) -> Self {
        self.transcription.language = language.to_string();
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn transcribe(&self, _audio: &Path) -> Result<RawTranscription> {
        if self.should_fail {
            Err(ScribeError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.transcription.clone())
        }
    }

    fn preload(&self) -> Result<()> {
        if self.should_fail {
            Err(ScribeError::Resource {
                message: "mock speech model assets missing".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

/// Mock diarizer for testing
#[derive(Debug, Clone, Default)]
pub struct MockDiarizer {
    spans: Vec<SpeakerSpan>,
    should_fail: bool,
}

impl MockDiarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to return specific speaker spans.
    pub fn with_spans(mut self, spans: Vec<SpeakerSpan>) -> Self {
        self.spans = spans;
        self
    }

    /// Configure the mock to fail on diarize.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Diarizer for MockDiarizer {
    fn diarize(
        &self,
        _audio: &Path,
        _min_speakers: usize,
        _max_speakers: usize,
    ) -> Result<Vec<SpeakerSpan>> {
        if self.should_fail {
            Err(ScribeError::Transcription {
                message: "mock diarization failure".to_string(),
            })
        } else {
            Ok(self.spans.clone())
        }
    }
}

/// Run the full transcription chain: transcribe → align → diarize → assign.
pub fn transcribe_encounter(
    speech: &dyn SpeechEngine,
    aligner: &dyn Aligner,
    diarizer: &dyn Diarizer,
    audio: &Path,
) -> Result<Transcript> {
    let raw = speech.transcribe(audio)?;
    let aligned = aligner.align(raw, audio)?;
    let spans = diarizer.diarize(audio, defaults::MIN_SPEAKERS, defaults::MAX_SPEAKERS)?;
    Ok(assign_speakers(aligned, &spans))
}
