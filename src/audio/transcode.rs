//! Normalization of arbitrary input audio into 16kHz mono PCM WAV.
//!
//! The transcoder is an external collaborator (ffmpeg); this module only
//! builds its invocation and maps failures into the error taxonomy.

use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::exec::CommandExecutor;
use std::path::Path;
use std::sync::Arc;

/// Normalizes input audio for the speech engine via the external transcoder.
pub struct AudioNormalizer {
    executor: Arc<dyn CommandExecutor>,
}

impl AudioNormalizer {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Transcode `input` (any container/codec) to 16kHz mono s16le WAV at
    /// `output`, overwriting an existing file.
    pub fn normalize(&self, input: &Path, output: &Path) -> Result<()> {
        let sample_rate = defaults::SAMPLE_RATE.to_string();
        let input_str = input.to_string_lossy();
        let output_str = output.to_string_lossy();
        let args = [
            "-y",
            "-i",
            input_str.as_ref(),
            "-ar",
            sample_rate.as_str(),
            "-ac",
            "1",
            "-c:a",
            "pcm_s16le",
            output_str.as_ref(),
        ];

        self.executor
            .execute(defaults::TRANSCODER_BIN, &args)
            .map_err(|e| match e {
                ScribeError::TranscoderNotFound { .. } => e,
                other => ScribeError::Transcode {
                    message: other.to_string(),
                },
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommandExecutor;

    #[test]
    fn test_normalize_builds_transcoder_invocation() {
        let executor = Arc::new(MockCommandExecutor::new());
        let normalizer = AudioNormalizer::new(executor.clone());
        normalizer
            .normalize(Path::new("upload.webm"), Path::new("converted_audio.wav"))
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "ffmpeg");
        assert_eq!(
            calls[0].args,
            vec![
                "-y",
                "-i",
                "upload.webm",
                "-ar",
                "16000",
                "-ac",
                "1",
                "-c:a",
                "pcm_s16le",
                "converted_audio.wav"
            ]
        );
    }

    #[test]
    fn test_normalize_failure_maps_to_transcode_error() {
        let executor = Arc::new(MockCommandExecutor::new().with_failure());
        let normalizer = AudioNormalizer::new(executor);
        let result = normalizer.normalize(Path::new("a.ogg"), Path::new("b.wav"));
        assert!(matches!(result, Err(ScribeError::Transcode { .. })));
    }
}
