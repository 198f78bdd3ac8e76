//! External model collaborators behind narrow request/response contracts.

pub mod command;
pub mod llm;
pub mod speech;

pub use llm::{MockGenerator, TextGenerator};
pub use speech::{
    Aligner, Diarizer, MockDiarizer, MockSpeechEngine, PassthroughAligner, RawSegment,
    RawTranscription, SpeakerSpan, SpeechEngine, assign_speakers, transcribe_encounter,
};

use crate::error::Result;
use std::sync::Arc;

/// The full set of model collaborators for one deployment.
///
/// Engines are shared across runs; all of them are stateless from this
/// crate's perspective.
#[derive(Clone)]
pub struct EngineSet {
    pub speech: Arc<dyn SpeechEngine>,
    pub aligner: Arc<dyn Aligner>,
    pub diarizer: Arc<dyn Diarizer>,
    pub generator: Arc<dyn TextGenerator>,
    pub verifier: Arc<dyn TextGenerator>,
}

impl EngineSet {
    /// Warm-load every engine sequentially, transcription side first so the
    /// speech models are cached before the heavier language models load.
    pub fn preload(&self) -> Result<()> {
        self.speech.preload()?;
        self.diarizer.preload()?;
        self.generator.preload()?;
        self.verifier.preload()?;
        Ok(())
    }
}
