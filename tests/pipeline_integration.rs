//! End-to-end pipeline tests over mock engines.
//!
//! These drive the orchestrator exactly as a caller would: start a run for
//! an audio file and consume the event stream until the terminal event.

use clinscribe::defaults;
use clinscribe::engines::{
    EngineSet, MockDiarizer, MockGenerator, MockSpeechEngine, PassthroughAligner, RawSegment,
    SpeakerSpan,
};
use clinscribe::exec::MockCommandExecutor;
use clinscribe::pipeline::{Orchestrator, StageEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn encounter_segments() -> Vec<RawSegment> {
    vec![
        RawSegment {
            text: "What brings you in today?".to_string(),
            start: 0.0,
            end: 2.0,
        },
        RawSegment {
            text: "I've had a cough for three days and my throat hurts.".to_string(),
            start: 2.0,
            end: 6.0,
        },
        RawSegment {
            text: "Let me listen to your lungs. They sound clear.".to_string(),
            start: 6.0,
            end: 10.0,
        },
    ]
}

fn encounter_spans() -> Vec<SpeakerSpan> {
    vec![
        SpeakerSpan {
            speaker: "SPEAKER_00".to_string(),
            start: 0.0,
            end: 2.0,
        },
        SpeakerSpan {
            speaker: "SPEAKER_01".to_string(),
            start: 2.0,
            end: 6.0,
        },
        SpeakerSpan {
            speaker: "SPEAKER_00".to_string(),
            start: 6.0,
            end: 10.0,
        },
    ]
}

fn engines(generated: &str, verdicts: Vec<String>) -> EngineSet {
    EngineSet {
        speech: Arc::new(MockSpeechEngine::new().with_segments(encounter_segments())),
        aligner: Arc::new(PassthroughAligner),
        diarizer: Arc::new(MockDiarizer::new().with_spans(encounter_spans())),
        generator: Arc::new(MockGenerator::new("soap-generator").with_response(generated)),
        verifier: Arc::new(
            MockGenerator::new("soap-verifier")
                .with_response("Answer: YES")
                .with_responses(verdicts),
        ),
    }
}

fn input_file(dir: &Path) -> PathBuf {
    let input = dir.join("encounter.ogg");
    std::fs::write(&input, b"opus audio bytes").expect("write input");
    input
}

#[tokio::test]
async fn full_run_produces_pruned_note_and_streams_ndjson_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().join("work");

    // Draft has one supported subjective claim, one fabricated plan claim.
    let generated = r#"{"subjective": "Cough for three days. Sore throat reported.", "objective": "", "assessment": "", "plan": "Antibiotics prescribed for ten days."}"#;
    let verdicts = vec![
        "Answer: YES\nReason: stated by the patient.\nQuote: \"a cough for three days\""
            .to_string(),
        "Answer: YES\nReason: stated by the patient.\nQuote: \"my throat hurts\"".to_string(),
        "Answer: HALLUCINATION\nReason: no antibiotics were mentioned.\nQuote: None".to_string(),
    ];

    let orchestrator = Orchestrator::new(
        engines(generated, verdicts),
        Arc::new(MockCommandExecutor::new()),
        &work_dir,
    );
    let events = orchestrator.process(input_file(dir.path())).collect().await;

    // Every event serializes as one NDJSON line
    for event in &events {
        let line = event.to_ndjson().expect("serialize");
        assert!(line.ends_with('\n'));
        assert_eq!(StageEvent::from_json(line.trim()).expect("parse"), *event);
    }

    // Exactly one terminal event, and it is last
    let terminal: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(terminal, vec![events.len() - 1]);

    match events.last().expect("events") {
        StageEvent::Done { soap, quotes } => {
            assert_eq!(soap.subjective, "Cough for three days. Sore throat reported.");
            assert_eq!(soap.plan, defaults::PLACEHOLDER);
            assert_eq!(
                quotes.subjective,
                vec![
                    "a cough for three days".to_string(),
                    "my throat hurts".to_string()
                ]
            );
            assert!(quotes.plan.is_empty());
        }
        other => panic!("expected done event, got {other:?}"),
    }
}

#[tokio::test]
async fn run_writes_all_work_directory_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().join("work");

    let generated =
        r#"{"subjective": "Cough for three days.", "objective": "", "assessment": "", "plan": ""}"#;
    let orchestrator = Orchestrator::new(
        engines(generated, vec![]),
        Arc::new(MockCommandExecutor::new()),
        &work_dir,
    );
    orchestrator.process(input_file(dir.path())).collect().await;

    assert!(work_dir.join("transcript.json").exists());
    assert!(work_dir.join("formatted_dialogue.txt").exists());
    assert!(work_dir.join("draft_soap.json").exists());
    assert!(work_dir.join("final_soap_summary.json").exists());
    assert!(
        !work_dir.join("temp_input.ogg").exists(),
        "temporary input is removed after the run"
    );

    let dialogue = std::fs::read_to_string(work_dir.join("formatted_dialogue.txt")).expect("read");
    assert_eq!(
        dialogue,
        "Doctor: What brings you in today?\n\
         Patient: I've had a cough for three days and my throat hurts.\n\
         Doctor: Let me listen to your lungs. They sound clear."
    );
}

#[tokio::test]
async fn stage_failure_stops_the_pipeline_before_later_stages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().join("work");

    let generator = Arc::new(MockGenerator::new("soap-generator").with_failure());
    let verifier = Arc::new(MockGenerator::new("soap-verifier"));
    let set = EngineSet {
        speech: Arc::new(MockSpeechEngine::new().with_segments(encounter_segments())),
        aligner: Arc::new(PassthroughAligner),
        diarizer: Arc::new(MockDiarizer::new().with_spans(encounter_spans())),
        generator: generator.clone(),
        verifier: verifier.clone(),
    };

    let orchestrator = Orchestrator::new(set, Arc::new(MockCommandExecutor::new()), &work_dir);
    let events = orchestrator.process(input_file(dir.path())).collect().await;

    assert_eq!(
        events.last(),
        Some(&StageEvent::error("SOAP processing failed."))
    );
    assert_eq!(
        verifier.call_count(),
        0,
        "verification never starts after generation fails"
    );
}

#[tokio::test]
async fn transcoder_invocation_normalizes_to_16khz_mono_wav() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().join("work");

    let executor = Arc::new(MockCommandExecutor::new());
    let generated =
        r#"{"subjective": "Cough for three days.", "objective": "", "assessment": "", "plan": ""}"#;
    let orchestrator = Orchestrator::new(engines(generated, vec![]), executor.clone(), &work_dir);
    orchestrator.process(input_file(dir.path())).collect().await;

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command, "ffmpeg");
    let args = &calls[0].args;
    assert!(args.contains(&"-ar".to_string()) && args.contains(&"16000".to_string()));
    assert!(args.contains(&"-ac".to_string()) && args.contains(&"1".to_string()));
    assert!(args.contains(&"pcm_s16le".to_string()));
}

#[tokio::test]
async fn concurrent_runs_in_separate_work_dirs_both_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generated =
        r#"{"subjective": "Cough for three days.", "objective": "", "assessment": "", "plan": ""}"#;

    let first = Orchestrator::new(
        engines(generated, vec![]),
        Arc::new(MockCommandExecutor::new()),
        &dir.path().join("work-a"),
    );
    let second = Orchestrator::new(
        engines(generated, vec![]),
        Arc::new(MockCommandExecutor::new()),
        &dir.path().join("work-b"),
    );

    let input = input_file(dir.path());
    let (events_a, events_b) = tokio::join!(
        first.process(input.clone()).collect(),
        second.process(input).collect()
    );

    assert!(matches!(events_a.last(), Some(StageEvent::Done { .. })));
    assert!(matches!(events_b.last(), Some(StageEvent::Done { .. })));
}
