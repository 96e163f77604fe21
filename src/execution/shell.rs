//! Shell command runner - the one seam through which external programs run

use async_trait::async_trait;
use std::io;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (-1 when terminated by a signal)
    pub code: i32,
    /// Raw bytes the command wrote to stdout
    pub stdout: Vec<u8>,
    /// Decoded stderr text for error reporting
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs a command line and captures exit code, stdout and stderr.
///
/// Kept behind a trait so tests can substitute a canned implementation
/// without spawning processes. Variable expansion happens upstream of this
/// boundary; callers hand over the final command string.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> io::Result<CommandOutput>;
}

/// Executes command lines through the system shell (`sh -c`).
///
/// The runner blocks on the child until it exits; no timeout is imposed, so
/// a command that never terminates stalls the pipeline. That is a known
/// limitation of the sequential model.
#[derive(Debug, Clone, Default)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemShell {
    async fn run(&self, command: &str) -> io::Result<CommandOutput> {
        debug!("spawning shell command: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await?;

        let result = CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "command exited with code {} ({} bytes of stdout)",
            result.code,
            result.stdout.len()
        );

        Ok(result)
    }
}
