//! Streaming event protocol for pipeline runs.
//!
//! Events are newline-delimited JSON objects tagged by `status`. They are
//! immutable once emitted; ordering within a stage is preserved by the
//! bridge.

use crate::soap::note::{SectionQuotes, SoapNote};
use crate::transcript::Utterance;
use serde::{Deserialize, Serialize};

/// One progress event emitted by a stage or by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageEvent {
    /// A run has been accepted and is starting.
    Start { message: String },
    /// Free-form progress from inside a stage.
    Info { message: String },
    /// A failure report. The last event of a failed run.
    Error { message: String },
    /// The transcript artifacts, emitted once when transcription succeeds.
    TranscriptionDone {
        transcription: String,
        detailed_transcript: Vec<Utterance>,
    },
    /// A stage's exit report. `code == 0` is the sole success signal;
    /// consumed by the orchestrator, never forwarded to callers.
    Returncode { code: i32, message: String },
    /// The final verified note. The last event of a successful run.
    Done {
        soap: SoapNote,
        quotes: SectionQuotes,
    },
}

impl StageEvent {
    pub fn start(message: impl Into<String>) -> Self {
        StageEvent::Start {
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        StageEvent::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StageEvent::Error {
            message: message.into(),
        }
    }

    pub fn returncode(code: i32, message: impl Into<String>) -> Self {
        StageEvent::Returncode {
            code,
            message: message.into(),
        }
    }

    /// Whether this event kind can end a run's stream. The final event of
    /// every run is terminal (`done` or `error`); a failing stage may also
    /// surface an `error` diagnostic before the terminal one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageEvent::Done { .. } | StageEvent::Error { .. })
    }

    /// Serialize event to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize event as one NDJSON line (trailing newline included).
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{}\n", self.to_json()?))
    }

    /// Deserialize event from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
