//! Pipeline orchestration: normalize → transcribe → generate → verify.
//!
//! Each stage runs as blocking work on its own worker thread behind the
//! progress bridge; the orchestrator consumes stage streams on the
//! dispatcher, forwards progress to the caller, and enforces the stage
//! success contract: an explicit `returncode` event carrying code 0.
//! Exactly one terminal event (`done` or `error`) is emitted per run.

use crate::audio::AudioNormalizer;
use crate::defaults;
use crate::engines::{EngineSet, assign_speakers};
use crate::error::{Result, ScribeError};
use crate::exec::CommandExecutor;
use crate::pipeline::bridge::{StageRunner, StageStream};
use crate::pipeline::event::StageEvent;
use crate::soap::note::{SectionQuotes, SoapNote};
use crate::soap::repair::RepairCascade;
use crate::soap::rules::RulesEngine;
use crate::soap::verify::ClaimVerifier;
use crate::soap::{FinalNote, prompt};
use crate::transcript::Utterance;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Run lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Normalizing,
    Transcribing,
    TranscriptReady,
    Generating,
    Verifying,
    Done,
    Failed,
}

/// Overall status derived from the run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Done,
    Failed,
}

/// Exit report of one completed stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub stage: &'static str,
    pub code: i32,
}

/// State of one pipeline run. Created per request, owned exclusively by the
/// orchestrator, dropped after the terminal event.
#[derive(Debug)]
pub struct PipelineRun {
    pub id: Uuid,
    state: RunState,
    outcomes: Vec<StageOutcome>,
    started: Instant,
    finished: Option<Instant>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RunState::Init,
            outcomes: Vec::new(),
            started: Instant::now(),
            finished: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn status(&self) -> RunStatus {
        match self.state {
            RunState::Done => RunStatus::Done,
            RunState::Failed => RunStatus::Failed,
            _ => RunStatus::Running,
        }
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.finished.unwrap_or_else(Instant::now) - self.started
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            !matches!(self.state, RunState::Done | RunState::Failed),
            "run already terminal"
        );
        self.state = next;
    }

    fn record(&mut self, outcome: StageOutcome) {
        self.outcomes.push(outcome);
    }

    fn finish(&mut self, state: RunState) {
        self.state = state;
        self.finished = Some(Instant::now());
    }
}

/// Fixed artifact locations inside the work directory.
///
/// File names are fixed and reused across runs; concurrent runs against one
/// work directory are not safe. Deployments that need parallel runs point
/// each at its own directory.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    pub dir: PathBuf,
    pub normalized_audio: PathBuf,
    pub transcript_json: PathBuf,
    pub dialogue_text: PathBuf,
    pub draft_note: PathBuf,
    pub final_note: PathBuf,
}

impl WorkPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            normalized_audio: dir.join(defaults::NORMALIZED_AUDIO_FILE),
            transcript_json: dir.join(defaults::TRANSCRIPT_JSON_FILE),
            dialogue_text: dir.join(defaults::DIALOGUE_TEXT_FILE),
            draft_note: dir.join(defaults::DRAFT_NOTE_FILE),
            final_note: dir.join(defaults::FINAL_NOTE_FILE),
        }
    }
}

/// Deletes a temporary artifact when dropped, on every exit path.
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Tuning knobs for a run's model calls.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Token budget for the note-drafting call.
    pub generation_max_tokens: usize,
    /// Token budget per verifier oracle query.
    pub verify_max_tokens: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            generation_max_tokens: defaults::GENERATION_MAX_TOKENS,
            verify_max_tokens: defaults::VERIFY_MAX_TOKENS,
        }
    }
}

/// The caller's view of a run: an ordered event stream ending with exactly
/// one terminal event.
pub struct RunStream {
    rx: mpsc::Receiver<StageEvent>,
}

impl RunStream {
    /// Receive the next event. Returns `None` after the terminal event has
    /// been delivered and the run state dropped.
    pub async fn next(&mut self) -> Option<StageEvent> {
        self.rx.recv().await
    }

    /// Drain the whole run into a vector. Intended for tests and batch
    /// callers that do not need streaming.
    pub async fn collect(mut self) -> Vec<StageEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// Sequences the pipeline stages for incoming audio files.
pub struct Orchestrator {
    engines: EngineSet,
    executor: Arc<dyn CommandExecutor>,
    paths: WorkPaths,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(engines: EngineSet, executor: Arc<dyn CommandExecutor>, work_dir: &Path) -> Self {
        Self {
            engines,
            executor,
            paths: WorkPaths::in_dir(work_dir),
            settings: PipelineSettings::default(),
        }
    }

    /// Override the default model-call settings.
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn work_paths(&self) -> &WorkPaths {
        &self.paths
    }

    /// Start a run for one audio file and return its event stream.
    ///
    /// The run executes on the dispatcher plus one worker thread per stage.
    /// Dropping the stream does not stop in-flight stage execution
    /// (documented limitation: no mid-run cancellation).
    pub fn process(&self, input: PathBuf) -> RunStream {
        let (tx, rx) = mpsc::channel(defaults::RUN_BUFFER);
        let engines = self.engines.clone();
        let executor = Arc::clone(&self.executor);
        let paths = self.paths.clone();
        let settings = self.settings.clone();

        tokio::spawn(async move {
            let mut run = PipelineRun::new();
            match run_stages(&engines, &executor, &paths, &settings, &input, &tx, &mut run).await {
                Ok((soap, quotes)) => {
                    run.finish(RunState::Done);
                    let _ = tx.send(StageEvent::Done { soap, quotes }).await;
                }
                Err(e) => {
                    run.finish(RunState::Failed);
                    let _ = tx.send(StageEvent::error(terminal_message(&e))).await;
                }
            }
        });

        RunStream { rx }
    }
}

/// Execute all stages in order, forwarding progress to the caller.
/// Partial results of a failed stage are discarded with it.
async fn run_stages(
    engines: &EngineSet,
    executor: &Arc<dyn CommandExecutor>,
    paths: &WorkPaths,
    settings: &PipelineSettings,
    input: &Path,
    tx: &mpsc::Sender<StageEvent>,
    run: &mut PipelineRun,
) -> Result<(SoapNote, SectionQuotes)> {
    std::fs::create_dir_all(&paths.dir)?;

    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".tmp".to_string());
    let temp_input = paths.dir.join(format!("temp_input{ext}"));
    std::fs::copy(input, &temp_input)?;
    // Deleted on every exit path — success, stage failure, or panic unwind.
    let _temp_input_guard = TempArtifact::new(temp_input.clone());

    forward(
        tx,
        StageEvent::start(format!("File received. Normalizing from {ext}...")),
    )
    .await;

    // Stage 1: normalize audio for the speech engine
    run.advance(RunState::Normalizing);
    let stream = spawn_normalize_stage(
        Arc::clone(executor),
        temp_input,
        paths.normalized_audio.clone(),
    );
    drive_stage("normalize", stream, tx, run).await?;

    forward(
        tx,
        StageEvent::info("Audio normalized. Starting transcription..."),
    )
    .await;

    // Stage 2: transcription chain
    run.advance(RunState::Transcribing);
    let stream = spawn_transcribe_stage(engines.clone(), paths.clone());
    drive_stage("transcribe", stream, tx, run).await?;
    run.advance(RunState::TranscriptReady);

    let transcription = std::fs::read_to_string(&paths.dialogue_text)?;
    let detailed_transcript: Vec<Utterance> = match std::fs::read_to_string(&paths.transcript_json)
    {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    forward(
        tx,
        StageEvent::TranscriptionDone {
            transcription,
            detailed_transcript,
        },
    )
    .await;
    forward(
        tx,
        StageEvent::info("Transcription complete. Starting generation and pruning..."),
    )
    .await;

    // Stage 3: draft note generation
    run.advance(RunState::Generating);
    let stream = spawn_generate_stage(engines.clone(), paths.clone(), settings.clone());
    drive_stage("generate", stream, tx, run).await?;

    // Stage 4: claim verification and pruning
    run.advance(RunState::Verifying);
    let stream = spawn_verify_stage(engines.clone(), paths.clone(), settings.clone());
    drive_stage("verify", stream, tx, run).await?;

    let final_note = FinalNote::read(&paths.final_note)?;
    Ok((final_note.soap, final_note.quotes))
}

/// Consume one stage's stream: forward everything except `returncode` to the
/// caller, and fail unless the stage reported code 0 with no error event.
async fn drive_stage(
    name: &'static str,
    mut stream: StageStream,
    tx: &mpsc::Sender<StageEvent>,
    run: &mut PipelineRun,
) -> Result<()> {
    let mut code: Option<i32> = None;
    let mut worker_error: Option<String> = None;

    while let Some(event) = stream.next().await {
        match event {
            StageEvent::Returncode { code: c, .. } => {
                code = Some(c);
            }
            StageEvent::Error { message } => {
                worker_error = Some(message.clone());
                forward(tx, StageEvent::Error { message }).await;
            }
            other => forward(tx, other).await,
        }
    }

    if let Some(message) = worker_error {
        return Err(ScribeError::StageFailure {
            stage: name.to_string(),
            message,
        });
    }
    match code {
        Some(0) => {
            run.record(StageOutcome { stage: name, code: 0 });
            Ok(())
        }
        Some(code) => Err(ScribeError::StageFailure {
            stage: name.to_string(),
            message: format!("exited with returncode {code}"),
        }),
        None => Err(ScribeError::StageFailure {
            stage: name.to_string(),
            message: "no returncode event emitted".to_string(),
        }),
    }
}

async fn forward(tx: &mpsc::Sender<StageEvent>, event: StageEvent) {
    // A disconnected caller is not an error; the run finishes regardless.
    let _ = tx.send(event).await;
}

/// Caller-facing message for a failed run, naming the stage that died.
fn terminal_message(error: &ScribeError) -> String {
    match error {
        ScribeError::StageFailure { stage, .. } => match stage.as_str() {
            "normalize" => "Audio normalization (ffmpeg) failed.".to_string(),
            "transcribe" => "Transcription failed.".to_string(),
            "generate" | "verify" => "SOAP processing failed.".to_string(),
            other => format!("Stage '{other}' failed."),
        },
        other => format!("Internal backend error: {other}"),
    }
}

fn spawn_normalize_stage(
    executor: Arc<dyn CommandExecutor>,
    input: PathBuf,
    output: PathBuf,
) -> StageStream {
    StageRunner::spawn("normalize", move |sink| {
        let normalizer = AudioNormalizer::new(executor);
        normalizer.normalize(&input, &output)?;
        sink.returncode(0, "Audio normalized.");
        Ok(())
    })
}

fn spawn_transcribe_stage(engines: EngineSet, paths: WorkPaths) -> StageStream {
    StageRunner::spawn("transcribe", move |sink| {
        let total_start = Instant::now();

        sink.info("Started transcription...");
        let step = Instant::now();
        let raw = engines.speech.transcribe(&paths.normalized_audio)?;
        sink.info(format!(
            "Transcription finished in {:.2}s",
            step.elapsed().as_secs_f64()
        ));

        sink.info(format!(
            "Aligning timestamps for language: {}...",
            raw.language
        ));
        let step = Instant::now();
        let aligned = engines.aligner.align(raw, &paths.normalized_audio)?;
        sink.info(format!(
            "Alignment finished in {:.2}s",
            step.elapsed().as_secs_f64()
        ));

        sink.info("Diarizing audio...");
        let step = Instant::now();
        let spans = engines.diarizer.diarize(
            &paths.normalized_audio,
            defaults::MIN_SPEAKERS,
            defaults::MAX_SPEAKERS,
        )?;
        sink.info(format!(
            "Diarization finished in {:.2}s",
            step.elapsed().as_secs_f64()
        ));

        sink.info("Assigning speakers...");
        let transcript = assign_speakers(aligned, &spans);

        sink.info("Saving outputs...");
        transcript.write_artifacts(&paths.transcript_json, &paths.dialogue_text)?;

        sink.returncode(
            0,
            format!(
                "Done! Saved to {} and {}. Total time: {:.2}s",
                paths.transcript_json.display(),
                paths.dialogue_text.display(),
                total_start.elapsed().as_secs_f64()
            ),
        );
        Ok(())
    })
}

fn spawn_generate_stage(
    engines: EngineSet,
    paths: WorkPaths,
    settings: PipelineSettings,
) -> StageStream {
    StageRunner::spawn("generate", move |sink| {
        let dialogue = std::fs::read_to_string(&paths.dialogue_text)?;

        sink.info(format!(
            "Drafting note with {}...",
            engines.generator.model_name()
        ));
        let raw = engines.generator.generate(
            &prompt::generation_prompt(&dialogue),
            settings.generation_max_tokens,
        )?;

        let note = RepairCascade::new().repair(&raw)?;

        let warnings = RulesEngine::new().validate(&note, &dialogue);
        if warnings.is_empty() {
            sink.info("Validation passed with no preliminary warnings.");
        }
        for warning in &warnings {
            sink.info(format!("[validation] {warning}"));
        }

        let draft =
            serde_json::to_string_pretty(&note).map_err(|e| ScribeError::Other(e.to_string()))?;
        std::fs::write(&paths.draft_note, draft)?;

        sink.returncode(
            0,
            format!("Draft note saved to {}", paths.draft_note.display()),
        );
        Ok(())
    })
}

fn spawn_verify_stage(
    engines: EngineSet,
    paths: WorkPaths,
    settings: PipelineSettings,
) -> StageStream {
    StageRunner::spawn("verify", move |sink| {
        let dialogue = std::fs::read_to_string(&paths.dialogue_text)?;
        let draft: SoapNote = serde_json::from_str(&std::fs::read_to_string(&paths.draft_note)?)
            .map_err(|e| ScribeError::ParseFailure {
            message: format!("unreadable draft note: {e}"),
        })?;

        let verifier = ClaimVerifier::new(engines.verifier.as_ref())
            .with_max_tokens(settings.verify_max_tokens);
        let (pruned, quotes) = verifier.prune_note(&dialogue, &draft, &|line| sink.info(line))?;

        let final_note = FinalNote::assemble(pruned, quotes);
        final_note.write(&paths.final_note)?;

        sink.returncode(
            0,
            format!("Final note saved to {}", paths.final_note.display()),
        );
        Ok(())
    })
}
