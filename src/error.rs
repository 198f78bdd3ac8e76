//! Error types for clinscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Resource errors (missing files, model assets)
    #[error("Resource error: {message}")]
    Resource { message: String },

    // Audio normalization errors
    #[error("Transcoder tool not found: {tool}")]
    TranscoderNotFound { tool: String },

    #[error("Audio transcode failed: {message}")]
    Transcode { message: String },

    // Engine errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Generation failed: {message}")]
    Generation { message: String },

    #[error("Verifier oracle error: {message}")]
    Oracle { message: String },

    // Pipeline errors
    #[error("Stage '{stage}' failed: {message}")]
    StageFailure { stage: String, message: String },

    #[error("Could not recover a structured note: {message}")]
    ParseFailure { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = ScribeError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = ScribeError::ConfigInvalidValue {
            key: "engines.generate_command".to_string(),
            message: "must not be empty".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for engines.generate_command: must not be empty"
        );
    }

    #[test]
    fn test_resource_display() {
        let error = ScribeError::Resource {
            message: "model assets missing".to_string(),
        };
        assert_eq!(error.to_string(), "Resource error: model assets missing");
    }

    #[test]
    fn test_transcoder_not_found_display() {
        let error = ScribeError::TranscoderNotFound {
            tool: "ffmpeg".to_string(),
        };
        assert_eq!(error.to_string(), "Transcoder tool not found: ffmpeg");
    }

    #[test]
    fn test_transcode_display() {
        let error = ScribeError::Transcode {
            message: "exit status 1".to_string(),
        };
        assert_eq!(error.to_string(), "Audio transcode failed: exit status 1");
    }

    #[test]
    fn test_stage_failure_display() {
        let error = ScribeError::StageFailure {
            stage: "transcribe".to_string(),
            message: "no returncode event".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Stage 'transcribe' failed: no returncode event"
        );
    }

    #[test]
    fn test_parse_failure_display() {
        let error = ScribeError::ParseFailure {
            message: "no recoverable section".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not recover a structured note: no recoverable section"
        );
    }

    #[test]
    fn test_oracle_display() {
        let error = ScribeError::Oracle {
            message: "verifier call failed".to_string(),
        };
        assert_eq!(error.to_string(), "Verifier oracle error: verifier call failed");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: ScribeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribeError>();
        assert_sync::<ScribeError>();
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: ScribeError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }
}
