use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::edge::ScriptEdge;
use crate::error::ScriptError;

/// Component H: invokes artifact-shipped state scripts by lifecycle edge,
/// structurally identical to the update-module runner's process discipline
/// but with its own timeout/retry knobs and a relaxed contract for
/// `*_Error` edges.
pub struct ScriptRunner {
    scripts_dir: PathBuf,
    timeout: Duration,
    retry_interval: Duration,
    retry_timeout: Duration,
}

impl ScriptRunner {
    pub fn new(data_dir: &Path, timeout: Duration, retry_interval: Duration, retry_timeout: Duration) -> Self {
        Self { scripts_dir: data_dir.join("scripts"), timeout, retry_interval, retry_timeout }
    }

    /// Wipes the scripts directory, called before unpacking a new artifact's
    /// scripts so a previous deployment's scripts can never leak forward.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.scripts_dir.exists() {
            std::fs::remove_dir_all(&self.scripts_dir)?;
        }
        std::fs::create_dir_all(&self.scripts_dir)
    }

    fn scripts_for(&self, edge: ScriptEdge) -> Vec<PathBuf> {
        let prefix = format!("{}_", edge.name());
        let mut found: Vec<PathBuf> = match std::fs::read_dir(&self.scripts_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    let is_executable = std::fs::metadata(p)
                        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
                        .unwrap_or(false);
                    is_executable
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with(&prefix))
                            .unwrap_or(false)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        found.sort();
        found
    }

    /// Runs every script registered at `edge`, in ordinal order. Enter/Leave
    /// edges are retried on failure until `retry_timeout` elapses; `*_Error`
    /// edges run best-effort and never fail the caller.
    pub async fn run_edge(&self, edge: ScriptEdge) -> Result<(), ScriptError> {
        let scripts = self.scripts_for(edge);
        if scripts.is_empty() {
            return Err(ScriptError::NothingToDo);
        }

        for script in scripts {
            match self.run_one_with_retry(&script, edge.is_error_edge()).await {
                Ok(()) => continue,
                Err(ScriptError::SkipRemaining) => return Ok(()),
                Err(e) => {
                    if edge.is_error_edge() {
                        log::warn!("error-edge script {} failed, ignoring: {}", script.display(), e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn run_one_with_retry(&self, script: &Path, best_effort: bool) -> Result<(), ScriptError> {
        let deadline = Instant::now() + self.retry_timeout;
        loop {
            match run_once(script, self.timeout).await {
                Ok(()) => return Ok(()),
                Err(e @ ScriptError::SkipRemaining) => return Err(e),
                Err(e) => {
                    if best_effort || Instant::now() >= deadline {
                        return Err(e);
                    }
                    log::warn!("script {} failed ({}), retrying", script.display(), e);
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }
}

async fn run_once(script: &Path, timeout: Duration) -> Result<(), ScriptError> {
    let work_dir = script.parent().unwrap_or_else(|| Path::new("."));
    let mut child: Child = Command::new(script)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let outcome = tokio::time::timeout(timeout, child.wait()).await;
    match outcome {
        Ok(Ok(status)) => match status.code() {
            Some(0) => Ok(()),
            Some(21) => Err(ScriptError::SkipRemaining),
            Some(code) => Err(ScriptError::NonZeroExitStatus(code)),
            None => Err(ScriptError::NonZeroExitStatus(-1)),
        },
        Ok(Err(e)) => Err(e.into()),
        Err(_elapsed) => {
            kill_with_grace(&mut child).await;
            Err(ScriptError::TimedOut)
        }
    }
}

async fn kill_with_grace(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
            let grace = tokio::time::timeout(Duration::from_secs(5), child.wait()).await;
            if grace.is_ok() {
                return;
            }
        }
    }
    let _ = child.start_kill();
    let _ = child.wait().await;
}
