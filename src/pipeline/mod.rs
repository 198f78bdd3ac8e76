//! Pipeline runtime: stage workers, the progress bridge, and the
//! orchestrator that sequences them.
//!
//! Stage work is blocking and runs on dedicated worker threads; the
//! dispatcher consumes each stage's event stream through a bounded channel
//! and stays responsive to concurrent runs.

pub mod bridge;
pub mod event;
pub mod orchestrator;

pub use bridge::{EventSink, StageRunner, StageStream};
pub use event::StageEvent;
pub use orchestrator::{
    Orchestrator, PipelineRun, PipelineSettings, RunState, RunStatus, RunStream, StageOutcome,
    WorkPaths,
};
