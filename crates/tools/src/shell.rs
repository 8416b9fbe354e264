//! Shell tool. Executes a command line under a wall-clock timeout.
//!
//! There is no allowlist or workspace scoping: whatever the model asks for
//! runs with the user's privileges. The timeout is the only guard. On unix
//! each command gets its own process group, and a timed-out or cancelled
//! command has the whole group killed, so forked helpers die with it.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use termagent_core::error::ToolError;
use termagent_core::tool::{Tool, ToolId};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Observation used when a command succeeds without printing anything.
pub const EMPTY_OUTPUT: &str = "Command executed successfully with no output";

/// Execute shell commands with a timeout.
pub struct ShellTool {
    timeout: Duration,
}

impl ShellTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn command(line: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", line]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", line]);
            c
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    fn failed(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: ToolId::ExecuteCommand.as_str().into(),
            reason: reason.into(),
        }
    }
}

/// The process group of a spawned command. Dropping it SIGKILLs every
/// member unless the command ran to completion first.
#[cfg_attr(not(unix), allow(dead_code))]
struct ProcessGroup(Option<i32>);

impl ProcessGroup {
    /// The child leads its own group, so its pid is the group id.
    fn of(child: &Child) -> Self {
        Self(child.id().and_then(|id| i32::try_from(id).ok()))
    }

    fn release(&mut self) {
        self.0 = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.0.take() {
            use nix::sys::signal::{Signal, killpg};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                Ok(()) => debug!(pgid, "Killed command process group"),
                Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => warn!(pgid, error = %e, "Failed to kill command process group"),
            }
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn id(&self) -> ToolId {
        ToolId::ExecuteCommand
    }

    fn description(&self) -> &str {
        "executeCommand(command: string): string. Takes a shell command, executes it on the user's machine and returns its output."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let line = input.trim();
        if line.is_empty() {
            return Err(ToolError::InvalidInput("command must not be empty".into()));
        }

        debug!(command = %line, timeout_secs = self.timeout.as_secs(), "Executing shell command");

        let child = Self::command(line)
            .spawn()
            .map_err(|e| Self::failed(format!("failed to spawn: {e}")))?;
        // Held across the await: a timeout or a dropped future kills the group.
        let mut group = ProcessGroup::of(&child);

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => {
                group.release();
                result.map_err(|e| Self::failed(e.to_string()))?
            }
            Err(_) => {
                warn!(command = %line, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: ToolId::ExecuteCommand.as_str().into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            warn!(command = %line, exit_code = %code, "Command failed");
            let detail = if stderr.is_empty() { stdout } else { stderr };
            let reason = if detail.is_empty() {
                format!("exit code {code}")
            } else {
                format!("exit code {code}: {detail}")
            };
            return Err(Self::failed(reason));
        }

        Ok(match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => EMPTY_OUTPUT.to_string(),
            (false, true) => stdout,
            (true, false) => format!("[stderr]: {stderr}"),
            (false, false) => format!("{stdout}\n[stderr]: {stderr}"),
        })
    }
}
