use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub engines: EnginesConfig,
    pub verification: VerificationConfig,
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Work directory for run artifacts. Fixed file names inside it are
    /// reused across runs, so one directory serializes runs.
    pub work_dir: Option<PathBuf>,
}

/// External engine commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EnginesConfig {
    /// Transcription command: receives the audio path, prints segment JSON.
    pub speech_command: Option<String>,
    /// Diarization command: receives speaker bounds and the audio path,
    /// prints speaker-span JSON.
    pub diarize_command: Option<String>,
    /// Note generation command: receives the prompt on stdin.
    pub generate_command: Option<String>,
    /// Verifier oracle command: receives the query on stdin.
    pub verify_command: Option<String>,
}

/// Verification tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerificationConfig {
    pub generation_max_tokens: usize,
    pub verify_max_tokens: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            generation_max_tokens: defaults::GENERATION_MAX_TOKENS,
            verify_max_tokens: defaults::VERIFY_MAX_TOKENS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CLINSCRIBE_WORK_DIR → paths.work_dir
    /// - CLINSCRIBE_GENERATE_COMMAND → engines.generate_command
    /// - CLINSCRIBE_VERIFY_COMMAND → engines.verify_command
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("CLINSCRIBE_WORK_DIR")
            && !dir.is_empty()
        {
            self.paths.work_dir = Some(PathBuf::from(dir));
        }

        if let Ok(command) = std::env::var("CLINSCRIBE_GENERATE_COMMAND")
            && !command.is_empty()
        {
            self.engines.generate_command = Some(command);
        }

        if let Ok(command) = std::env::var("CLINSCRIBE_VERIFY_COMMAND")
            && !command.is_empty()
        {
            self.engines.verify_command = Some(command);
        }

        self
    }

    /// Resolve the work directory: configured value or the user cache dir.
    pub fn work_dir(&self) -> PathBuf {
        self.paths.work_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("clinscribe")
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/clinscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("clinscribe")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.work_dir, None);
        assert_eq!(config.engines.generate_command, None);
        assert_eq!(config.verification.generation_max_tokens, 1024);
        assert_eq!(config.verification.verify_max_tokens, 160);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[paths]
work_dir = "/var/lib/clinscribe"

[engines]
speech_command = "whisper-transcribe --fast"
generate_command = "soap-generate"

[verification]
verify_max_tokens = 200
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.paths.work_dir,
            Some(PathBuf::from("/var/lib/clinscribe"))
        );
        assert_eq!(
            config.engines.speech_command.as_deref(),
            Some("whisper-transcribe --fast")
        );
        assert_eq!(config.engines.diarize_command, None);
        assert_eq!(config.verification.verify_max_tokens, 200);
        // Unspecified fields keep defaults
        assert_eq!(config.verification.generation_max_tokens, 1024);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not = valid = toml").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_propagates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key = 'unclosed").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_env_override_work_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env("CLINSCRIBE_WORK_DIR", "/tmp/override");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.paths.work_dir, Some(PathBuf::from("/tmp/override")));

        remove_env("CLINSCRIBE_WORK_DIR");
    }

    #[test]
    fn test_env_override_commands() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env("CLINSCRIBE_GENERATE_COMMAND", "gen-override");
        set_env("CLINSCRIBE_VERIFY_COMMAND", "verify-override");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.engines.generate_command.as_deref(), Some("gen-override"));
        assert_eq!(config.engines.verify_command.as_deref(), Some("verify-override"));

        remove_env("CLINSCRIBE_GENERATE_COMMAND");
        remove_env("CLINSCRIBE_VERIFY_COMMAND");
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env("CLINSCRIBE_WORK_DIR", "");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.paths.work_dir, None);

        remove_env("CLINSCRIBE_WORK_DIR");
    }

    #[test]
    fn test_work_dir_resolution_prefers_configured() {
        let config = Config {
            paths: PathsConfig {
                work_dir: Some(PathBuf::from("/data/scribe")),
            },
            ..Default::default()
        };
        assert_eq!(config.work_dir(), PathBuf::from("/data/scribe"));
    }

    #[test]
    fn test_work_dir_resolution_falls_back() {
        let config = Config::default();
        let dir = config.work_dir();
        assert!(dir.ends_with("clinscribe"));
    }
}
