//! Program execution shared by the code and data tools.
//!
//! The program text is written to a scratch file and handed to the
//! configured interpreter, bounded by a timeout.

use std::path::PathBuf;
use std::time::Duration;

use reactloop_core::error::ToolError;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of one interpreter run.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    /// Failure detail suitable for an observation.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exit code {}", self.exit_code.unwrap_or(-1))
        } else {
            stderr.to_string()
        }
    }
}

/// Runs program text with an interpreter.
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: String,
    timeout: Duration,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `code` and capture its output.
    ///
    /// A non-zero exit is a normal [`ExecOutput`]; only failing to start the
    /// interpreter or exceeding the timeout is an error.
    pub async fn run(&self, tool_name: &str, code: &str) -> Result<ExecOutput, ToolError> {
        let script = scratch_path();
        tokio::fs::write(&script, code)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("could not write program: {e}"),
            })?;

        debug!(interpreter = %self.program, script = %script.display(), "Executing program");

        let result = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .arg(&script)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let _ = tokio::fs::remove_file(&script).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: tool_name.into(),
                    reason: format!("could not start '{}': {e}", self.program),
                });
            }
            Err(_) => {
                warn!(interpreter = %self.program, timeout_secs = self.timeout.as_secs(), "Program timed out");
                return Err(ToolError::Timeout {
                    tool_name: tool_name.into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let exec = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        };

        if !exec.success {
            warn!(interpreter = %self.program, exit_code = ?exec.exit_code, "Program failed");
        }
        Ok(exec)
    }

    /// Install packages with `<interpreter> -m pip install <package>`.
    pub async fn pip_install(&self, tool_name: &str, packages: &[String]) -> Result<(), ToolError> {
        for package in packages {
            debug!(package = %package, "Installing package");
            let status = tokio::time::timeout(
                self.timeout,
                Command::new(&self.program)
                    .args(["-m", "pip", "install", package.as_str()])
                    .kill_on_drop(true)
                    .output(),
            )
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: tool_name.into(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("pip install {package}: {e}"),
            })?;

            if !status.status.success() {
                return Err(ToolError::ExecutionFailed {
                    tool_name: tool_name.into(),
                    reason: format!(
                        "pip install {package} failed: {}",
                        String::from_utf8_lossy(&status.stderr).trim()
                    ),
                });
            }
        }
        Ok(())
    }
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("reactloop-{}.py", uuid::Uuid::new_v4()))
}
