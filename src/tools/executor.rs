//! Tool execution engine for running external formatters.
//!
//! This module handles the actual execution of external tools via stdin/stdout,
//! with timeout support and lazy tool availability checking.

use super::config::ToolDefinition;
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of executing a tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output from the tool.
    pub stdout: String,
    /// Standard error from the tool.
    pub stderr: String,
    /// Exit code (0 typically means success).
    pub exit_code: i32,
    /// Whether the tool executed successfully (exit code 0).
    pub success: bool,
}

/// Error during tool execution.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// Tool binary not found in PATH.
    #[error("Tool '{tool}' not found in PATH")]
    ToolNotFound { tool: String },
    /// Tool ran but reported a failure (non-zero exit).
    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
    /// Tool execution timed out.
    #[error("Tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },
    /// I/O error during execution.
    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Executor for running external tools.
///
/// Caches tool availability checks, so one executor is shared by every
/// worker thread of a run.
pub struct ToolExecutor {
    /// Cache of tool availability checks (tool name -> available).
    tool_cache: Arc<Mutex<HashMap<String, bool>>>,
    /// Timeout in milliseconds; zero waits indefinitely.
    timeout_ms: u64,
}

impl ToolExecutor {
    /// Create a new executor with the given timeout (0 = no timeout).
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            tool_cache: Arc::new(Mutex::new(HashMap::new())),
            timeout_ms,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Check if a tool is available (lazy, cached).
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        {
            let cache = self.tool_cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(&available) = cache.get(tool_name) {
                return available;
            }
        }

        let available = check_tool_exists(tool_name);
        log::debug!("Tool '{tool_name}' available: {available}");

        let mut cache = self.tool_cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(tool_name.to_string(), available);

        available
    }

    /// Execute a tool, writing `input` to its stdin when the definition asks for it.
    pub fn execute(&self, tool_def: &ToolDefinition, input: Option<&str>) -> Result<ToolOutput, ExecutorError> {
        if tool_def.command.is_empty() {
            return Err(ExecutorError::ExecutionFailed {
                tool: "unknown".to_string(),
                message: "Empty command".to_string(),
            });
        }

        let tool_name = &tool_def.command[0];

        if !self.is_tool_available(tool_name) {
            return Err(ExecutorError::ToolNotFound {
                tool: tool_name.clone(),
            });
        }

        log::debug!("Running {}", tool_def.command.join(" "));

        let mut cmd = Command::new(tool_name);
        cmd.args(&tool_def.command[1..]);

        let feed_stdin = tool_def.stdin && input.is_some();
        cmd.stdin(if feed_stdin { Stdio::piped() } else { Stdio::null() });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| ExecutorError::IoError {
            message: format!("Failed to spawn '{tool_name}': {e}"),
        })?;

        let stdout_handle = child
            .stdout
            .take()
            .map(|stdout| thread::spawn(move || read_pipe_to_string(stdout)));
        let stderr_handle = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || read_pipe_to_string(stderr)));

        if let Some(input) = input.filter(|_| feed_stdin)
            && let Some(mut stdin) = child.stdin.take()
        {
            // A tool may exit before reading everything; its exit status tells the story.
            if let Err(e) = stdin.write_all(input.as_bytes())
                && e.kind() != ErrorKind::BrokenPipe
            {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutorError::IoError {
                    message: format!("Failed to write to stdin of '{tool_name}': {e}"),
                });
            }
        }

        let status = match self.wait(&mut child, tool_name) {
            Ok(status) => status,
            Err(e) => {
                // Killed; the readers see EOF and finish.
                let _ = join_reader(stdout_handle);
                let _ = join_reader(stderr_handle);
                return Err(e);
            }
        };

        let stdout = join_reader(stdout_handle).map_err(|message| ExecutorError::IoError { message })?;
        let stderr = join_reader(stderr_handle).map_err(|message| ExecutorError::IoError { message })?;

        Ok(ToolOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            success: status.success(),
        })
    }

    /// Run a stdin/stdout filter and return what it printed.
    pub fn format(&self, tool_def: &ToolDefinition, input: &str) -> Result<String, ExecutorError> {
        if !tool_def.stdout {
            return Err(ExecutorError::ExecutionFailed {
                tool: tool_def.program().to_string(),
                message: "Formatter doesn't output to stdout".to_string(),
            });
        }

        let output = self.execute(tool_def, Some(input))?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(failure(tool_def, &output))
        }
    }

    /// Run a tool for its side effects only (e.g. in-place rewrites).
    pub fn run(&self, tool_def: &ToolDefinition) -> Result<ToolOutput, ExecutorError> {
        let output = self.execute(tool_def, None)?;
        if output.success {
            Ok(output)
        } else {
            Err(failure(tool_def, &output))
        }
    }
}

impl ToolExecutor {
    /// Wait for `child`, killing it once the timeout (if any) has passed.
    fn wait(&self, child: &mut Child, tool_name: &str) -> Result<ExitStatus, ExecutorError> {
        let io_error = |action: &str, e: std::io::Error| ExecutorError::IoError {
            message: format!("Failed to {action} '{tool_name}': {e}"),
        };

        if self.timeout_ms == 0 {
            return child.wait().map_err(|e| io_error("wait for", e));
        }

        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().map_err(|e| io_error("poll", e))? {
                return Ok(status);
            }
            thread::sleep(POLL_INTERVAL);
        }

        let _ = child.kill();
        let _ = child.wait();
        Err(ExecutorError::Timeout {
            tool: tool_name.to_string(),
            timeout_ms: self.timeout_ms,
        })
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new(0)
    }
}

fn failure(tool_def: &ToolDefinition, output: &ToolOutput) -> ExecutorError {
    ExecutorError::ExecutionFailed {
        tool: tool_def.program().to_string(),
        message: format!("Exit code {}: {}", output.exit_code, output.stderr.trim()),
    }
}

/// Check if a tool binary exists.
fn check_tool_exists(tool_name: &str) -> bool {
    #[cfg(unix)]
    let finder = "which";
    #[cfg(windows)]
    let finder = "where";

    Command::new(finder)
        .arg(tool_name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn read_pipe_to_string<R: Read>(mut pipe: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn join_reader(handle: Option<thread::JoinHandle<std::io::Result<String>>>) -> Result<String, String> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(res) => res.map_err(|e| format!("Failed to read output: {e}")),
            Err(_) => Err("Output reader thread panicked".to_string()),
        },
        None => Ok(String::new()),
    }
}
