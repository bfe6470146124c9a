// Scoped engine process: one child per attempt, torn down on every exit path.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::EngineError;

pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Owns a running engine child process.
///
/// Dropping the guard kills the child if it has not exited yet, which covers
/// errors, deadline expiry and dropped futures alike.
pub struct EngineProcess {
    child: Child,
    pid: Option<u32>,
}

impl EngineProcess {
    /// Spawn `command` with piped output.
    pub fn spawn(mut command: Command) -> Result<Self, EngineError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(EngineError::Launch)?;
        let pid = child.id();
        debug!("engine process started pid={:?}", pid);
        Ok(Self { child, pid })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Read both output streams to completion and wait for the exit status.
    pub async fn collect(&mut self) -> Result<ProcessOutput, EngineError> {
        let mut stdout_pipe = self.child.stdout.take();
        let mut stderr_pipe = self.child.stderr.take();

        let read_stdout = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let read_stderr = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };

        let (stdout, stderr) = tokio::try_join!(read_stdout, read_stderr)
            .map_err(|e| EngineError::Navigation(format!("reading engine output: {}", e)))?;
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| EngineError::Navigation(format!("waiting for engine: {}", e)))?;

        Ok(ProcessOutput {
            status,
            stdout,
            stderr,
        })
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("engine process pid={:?} still running, killing", self.pid);
                if let Err(e) = self.child.start_kill() {
                    warn!("failed to kill engine process pid={:?}: {}", self.pid, e);
                }
            }
            Err(e) => {
                warn!("failed to query engine process pid={:?}: {}", self.pid, e);
            }
        }
    }
}
