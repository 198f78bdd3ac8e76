//! Stage runner: runs one long blocking unit of work on a worker thread and
//! bridges its progress events into an ordered, guaranteed-terminating
//! stream.
//!
//! The worker emits into a bounded channel; the dispatcher consumes with a
//! native async receive, so it stays responsive to other runs without any
//! fixed-delay polling. Channel closure is the completion sentinel: the
//! bridge drops the sender when the work ends, whether it returned, errored,
//! or panicked, so the consumer's receive loop always terminates.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::event::StageEvent;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::sync::mpsc;

/// Emission side of the bridge, handed to stage work.
///
/// Emission order is preserved. If the consumer has gone away, events are
/// discarded — a disconnected caller does not stop in-flight work.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StageEvent>,
}

impl EventSink {
    pub fn emit(&self, event: StageEvent) {
        let _ = self.tx.blocking_send(event);
    }

    pub fn start(&self, message: impl Into<String>) {
        self.emit(StageEvent::start(message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(StageEvent::info(message));
    }

    pub fn returncode(&self, code: i32, message: impl Into<String>) {
        self.emit(StageEvent::returncode(code, message));
    }
}

/// Consumption side of the bridge.
pub struct StageStream {
    rx: mpsc::Receiver<StageEvent>,
}

impl StageStream {
    /// Receive the next event in emission order. Returns `None` once the
    /// stage has finished and every event has been drained.
    pub async fn next(&mut self) -> Option<StageEvent> {
        self.rx.recv().await
    }

    /// Drain the remaining events without yielding between them.
    /// Intended for tests and post-mortem inspection.
    pub async fn collect(mut self) -> Vec<StageEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// Spawns stage work on dedicated worker threads.
pub struct StageRunner;

impl StageRunner {
    /// Run `work` off the dispatch path.
    ///
    /// The returned stream yields the worker's events in emission order. An
    /// `Err` return or a panic inside the work is converted into a single
    /// `error` event; the stream then terminates. The bridge performs no
    /// interpretation of event content.
    pub fn spawn<F>(stage_name: &'static str, work: F) -> StageStream
    where
        F: FnOnce(&EventSink) -> Result<()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(defaults::EVENT_BUFFER);
        let sink = EventSink { tx };

        let spawned = std::thread::Builder::new()
            .name(format!("stage-{stage_name}"))
            .spawn({
                let sink = sink.clone();
                move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| work(&sink)));
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            sink.emit(StageEvent::error(format!(
                                "Exception in worker thread: {e}"
                            )));
                        }
                        Err(panic) => {
                            let message = panic
                                .downcast_ref::<&str>()
                                .copied()
                                .map(str::to_string)
                                .or_else(|| panic.downcast_ref::<String>().cloned())
                                .unwrap_or_else(|| "unknown panic".to_string());
                            sink.emit(StageEvent::error(format!(
                                "Exception in worker thread: {message}"
                            )));
                        }
                    }
                    // sink drops here: channel closes, stream terminates
                }
            });

        if let Err(e) = spawned {
            // try_send: this path runs on the dispatcher, not a worker thread
            let _ = sink.tx.try_send(StageEvent::error(format!(
                "Failed to start worker for stage '{stage_name}': {e}"
            )));
        }

        StageStream { rx }
    }
}
