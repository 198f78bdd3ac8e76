//! clinscribe - Clinical encounter audio to verified SOAP notes
//!
//! Transcribes a recorded doctor-patient encounter, drafts a four-section
//! SOAP note with a generation model, and prunes unsupported claims against
//! the transcript through a per-claim verifier oracle, streaming progress
//! events to the caller throughout.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engines;
pub mod error;
pub mod exec;
pub mod output;
pub mod pipeline;
pub mod soap;
pub mod transcript;
pub mod warmup;

// Core traits (engine seams)
pub use engines::{Aligner, Diarizer, EngineSet, SpeechEngine, TextGenerator};
pub use exec::{CommandExecutor, SystemCommandExecutor};

// Pipeline
pub use pipeline::{
    Orchestrator, PipelineSettings, RunState, RunStatus, RunStream, StageEvent, WorkPaths,
};

// Note structuring and verification
pub use soap::{
    AMBIGUOUS_VERDICT, FinalNote, RepairCascade, RulesEngine, Section, SectionQuotes, SoapNote,
    ValidationWarning, Verdict, VerdictKind,
};

// Transcript model
pub use transcript::{SpeakerRole, Transcript, Utterance};

// Error handling
pub use error::{Result, ScribeError};

// Config
pub use config::Config;

// Warm loading
pub use warmup::WarmupCoordinator;

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
