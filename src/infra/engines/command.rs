use std::{
    io::ErrorKind,
    path::PathBuf,
    process::Stdio,
    time::Instant,
};

use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

use crate::application::render::EngineError;

/// Runs an external engine: input on stdin, result on stdout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Spawn the program with its configured arguments followed by `extra`,
    /// feed `input` on stdin and return stdout once it exits successfully.
    pub async fn run(&self, extra: &[&str], input: &[u8]) -> Result<Vec<u8>, EngineError> {
        let started_at = Instant::now();
        let program = self.program.display().to_string();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(
                    target = "mathcast::engines::command",
                    program = %program,
                    error_code = if err.kind() == ErrorKind::NotFound { "not_found" } else { "spawn" },
                    error = %err,
                    "Failed to spawn engine"
                );
                EngineError::Spawn {
                    program: program.clone(),
                    message: err.to_string(),
                }
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok::<(), std::io::Error>(());
            };
            stdin.write_all(input).await?;
            stdin.shutdown().await
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|err| EngineError::Spawn {
            program: program.clone(),
            message: err.to_string(),
        })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                target = "mathcast::engines::command",
                program = %program,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                stderr = %stderr,
                "Engine exited unsuccessfully"
            );
            return Err(EngineError::Exit {
                program,
                exit_code,
                stderr,
            });
        }

        // The engine may exit without draining stdin; its exit status decides.
        if let Err(err) = fed
            && err.kind() != ErrorKind::BrokenPipe
        {
            return Err(EngineError::Spawn {
                program,
                message: format!("failed to write stdin: {err}"),
            });
        }

        debug!(
            target = "mathcast::engines::command",
            program = %program,
            subcommand = extra.first().copied().unwrap_or(""),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            stdout_bytes = output.stdout.len(),
            "Engine call complete"
        );

        Ok(output.stdout)
    }

    /// [`run`](Self::run) with UTF-8 text in and out.
    pub async fn run_text(&self, extra: &[&str], input: &str) -> Result<String, EngineError> {
        let stdout = self.run(extra, input.as_bytes()).await?;
        String::from_utf8(stdout)
            .map_err(|err| EngineError::protocol(format!("stdout is not UTF-8: {err}")))
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

    use tempfile::TempDir;

    /// Write an executable shell script into `dir`.
    pub(crate) fn fake_engine(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\nset -eu\n{body}\n")).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path
    }
}
