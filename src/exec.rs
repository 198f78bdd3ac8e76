//! Testable execution of external helper commands.
//!
//! The transcoder and the command-backed engine adapters shell out to
//! external tools. The `CommandExecutor` trait enables full testability
//! without external dependencies.

use crate::error::{Result, ScribeError};
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        self.execute_with_input(command, args, None)
    }

    /// Execute a command, optionally feeding `input` to its stdin.
    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<String>;
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<String> {
        let mut builder = Command::new(command);
        builder
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if input.is_some() {
            builder.stdin(Stdio::piped());
        }

        let mut child = builder.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::TranscoderNotFound {
                    tool: command.to_string(),
                }
            } else {
                ScribeError::Resource {
                    message: format!("Failed to spawn {}: {}", command, e),
                }
            }
        })?;

        if let Some(input) = input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(input.as_bytes())?;
            // Close stdin so the child sees EOF
            drop(stdin);
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::Resource {
                message: format!(
                    "{} failed with status {:?}: {}",
                    command, output.status, stderr
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Mock executor for testing: records every invocation and returns canned
/// output.
#[derive(Debug, Default)]
pub struct MockCommandExecutor {
    output: String,
    should_fail: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub command: String,
    pub args: Vec<String>,
    pub input: Option<String>,
}

impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the stdout returned on success.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    /// Configure the mock to fail on execute.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl CommandExecutor for MockCommandExecutor {
    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                command: command.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                input: input.map(|i| i.to_string()),
            });

        if self.should_fail {
            Err(ScribeError::Resource {
                message: format!("mock failure executing {}", command),
            })
        } else {
            Ok(self.output.clone())
        }
    }
}
