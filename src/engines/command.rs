//! Command-backed engine adapters.
//!
//! Deployments plug concrete model runtimes in as external commands: the
//! speech command receives the audio path as its final argument and prints a
//! transcription JSON; the diarization command prints speaker spans; the
//! generation commands receive the prompt on stdin and print raw text.

use crate::engines::llm::TextGenerator;
use crate::engines::speech::{Diarizer, RawTranscription, SpeakerSpan, SpeechEngine};
use crate::error::{Result, ScribeError};
use crate::exec::CommandExecutor;
use std::path::Path;
use std::sync::Arc;

/// Split a configured command line into program and leading arguments.
fn split_command(command_line: &str) -> Result<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or_else(|| ScribeError::ConfigInvalidValue {
        key: "engine command".to_string(),
        message: "must not be empty".to_string(),
    })?;
    Ok((program, parts.collect()))
}

/// Speech engine that shells out to a configured transcription command.
pub struct CommandSpeechEngine {
    program: String,
    base_args: Vec<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandSpeechEngine {
    pub fn new(command_line: &str, executor: Arc<dyn CommandExecutor>) -> Result<Self> {
        let (program, base_args) = split_command(command_line)?;
        Ok(Self {
            program,
            base_args,
            executor,
        })
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn transcribe(&self, audio: &Path) -> Result<RawTranscription> {
        let audio = audio.to_string_lossy();
        let mut args: Vec<&str> = self.base_args.iter().map(String::as_str).collect();
        args.push(audio.as_ref());

        let stdout = self.executor.execute(&self.program, &args)?;
        serde_json::from_str(&stdout).map_err(|e| ScribeError::Transcription {
            message: format!("malformed transcription output from {}: {}", self.program, e),
        })
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Diarizer that shells out to a configured diarization command.
pub struct CommandDiarizer {
    program: String,
    base_args: Vec<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandDiarizer {
    pub fn new(command_line: &str, executor: Arc<dyn CommandExecutor>) -> Result<Self> {
        let (program, base_args) = split_command(command_line)?;
        Ok(Self {
            program,
            base_args,
            executor,
        })
    }
}

impl Diarizer for CommandDiarizer {
    fn diarize(
        &self,
        audio: &Path,
        min_speakers: usize,
        max_speakers: usize,
    ) -> Result<Vec<SpeakerSpan>> {
        let audio = audio.to_string_lossy();
        let min_speakers = min_speakers.to_string();
        let max_speakers = max_speakers.to_string();
        let mut args: Vec<&str> = self.base_args.iter().map(String::as_str).collect();
        args.extend([
            "--min-speakers",
            min_speakers.as_str(),
            "--max-speakers",
            max_speakers.as_str(),
            audio.as_ref(),
        ]);

        let stdout = self.executor.execute(&self.program, &args)?;
        serde_json::from_str(&stdout).map_err(|e| ScribeError::Transcription {
            message: format!("malformed diarization output from {}: {}", self.program, e),
        })
    }
}

/// Text generator that feeds the prompt to a configured command via stdin.
pub struct CommandTextGenerator {
    program: String,
    base_args: Vec<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandTextGenerator {
    pub fn new(command_line: &str, executor: Arc<dyn CommandExecutor>) -> Result<Self> {
        let (program, base_args) = split_command(command_line)?;
        Ok(Self {
            program,
            base_args,
            executor,
        })
    }
}

impl TextGenerator for CommandTextGenerator {
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let max_tokens = max_tokens.to_string();
        let mut args: Vec<&str> = self.base_args.iter().map(String::as_str).collect();
        args.extend(["--max-tokens", max_tokens.as_str()]);

        self.executor
            .execute_with_input(&self.program, &args, Some(prompt))
            .map_err(|e| ScribeError::Generation {
                message: e.to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.program
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommandExecutor;

    #[test]
    fn test_split_command_with_args() {
        let (program, args) = split_command("python transcribe.py --fast").unwrap();
        assert_eq!(program, "python");
        assert_eq!(args, vec!["transcribe.py", "--fast"]);
    }

    #[test]
    fn test_split_command_empty_is_config_error() {
        assert!(matches!(
            split_command("   "),
            Err(ScribeError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_command_speech_engine_parses_json_output() {
        let stdout = r#"{"segments": [{"text": "Hello.", "start": 0.0, "end": 1.0}], "language": "en"}"#;
        let executor = Arc::new(MockCommandExecutor::new().with_output(stdout));
        let engine = CommandSpeechEngine::new("transcribe --fast", executor.clone()).unwrap();

        let result = engine.transcribe(Path::new("audio.wav")).unwrap();
        assert_eq!(result.language, "en");
        assert_eq!(result.segments.len(), 1);

        let call = &executor.calls()[0];
        assert_eq!(call.command, "transcribe");
        assert_eq!(call.args, vec!["--fast", "audio.wav"]);
    }

    #[test]
    fn test_command_speech_engine_malformed_output_is_error() {
        let executor = Arc::new(MockCommandExecutor::new().with_output("not json"));
        let engine = CommandSpeechEngine::new("transcribe", executor).unwrap();
        let result = engine.transcribe(Path::new("audio.wav"));
        assert!(matches!(result, Err(ScribeError::Transcription { .. })));
    }

    #[test]
    fn test_command_diarizer_passes_speaker_bounds() {
        let stdout = r#"[{"speaker": "SPEAKER_00", "start": 0.0, "end": 2.0}]"#;
        let executor = Arc::new(MockCommandExecutor::new().with_output(stdout));
        let diarizer = CommandDiarizer::new("diarize", executor.clone()).unwrap();

        let spans = diarizer.diarize(Path::new("audio.wav"), 2, 2).unwrap();
        assert_eq!(spans.len(), 1);

        let call = &executor.calls()[0];
        assert_eq!(
            call.args,
            vec!["--min-speakers", "2", "--max-speakers", "2", "audio.wav"]
        );
    }

    #[test]
    fn test_command_generator_feeds_prompt_via_stdin() {
        let executor = Arc::new(MockCommandExecutor::new().with_output("raw note text"));
        let generator = CommandTextGenerator::new("generate-soap", executor.clone()).unwrap();

        let out = generator.generate("the prompt", 1024).unwrap();
        assert_eq!(out, "raw note text");

        let call = &executor.calls()[0];
        assert_eq!(call.input.as_deref(), Some("the prompt"));
        assert_eq!(call.args, vec!["--max-tokens", "1024"]);
    }

    #[test]
    fn test_command_generator_failure_maps_to_generation_error() {
        let executor = Arc::new(MockCommandExecutor::new().with_failure());
        let generator = CommandTextGenerator::new("generate-soap", executor).unwrap();
        let result = generator.generate("p", 64);
        assert!(matches!(result, Err(ScribeError::Generation { .. })));
    }
}
