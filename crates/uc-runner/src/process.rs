use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::ModuleError;
use crate::subcommand::SubCommand;

pub struct SpawnedModule {
    pub child: Child,
}

/// Spawns `module_path <sub_command> <work_dir>` with stdout/stderr piped
/// and stdin closed (modules never read stdin in this protocol).
pub fn spawn(module_path: &Path, sub_command: SubCommand, work_dir: &Path) -> Result<SpawnedModule, ModuleError> {
    let child = Command::new(module_path)
        .arg(sub_command.as_str())
        .arg(work_dir)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    Ok(SpawnedModule { child })
}

/// Runs a non-streaming sub-command to completion under a deadline,
/// returning captured stdout on success. On timeout the child is killed
/// (SIGTERM, then SIGKILL after a short grace) and [`ModuleError::TimedOut`]
/// is returned.
pub async fn run_to_completion(
    module_path: &Path,
    sub_command: SubCommand,
    work_dir: &Path,
    timeout: Duration,
) -> Result<String, ModuleError> {
    let SpawnedModule { mut child } = spawn(module_path, sub_command, work_dir)?;

    let outcome = tokio::time::timeout(timeout, async {
        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout).await.ok();
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, stdout))
    })
    .await;

    match outcome {
        Ok(Ok((status, stdout))) => {
            if status.success() {
                Ok(stdout)
            } else {
                Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)))
            }
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_elapsed) => {
            kill_with_grace(&mut child).await;
            Err(ModuleError::TimedOut)
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

/// Parses a strict one-line `Yes`/`No` (or other fixed vocabulary) stdout
/// contract. Any extra content, including a trailing second line, is a
/// protocol error.
pub fn parse_one_line<'a>(stdout: &'a str, allowed: &[&str]) -> Result<&'a str, ModuleError> {
    let mut lines = stdout.lines();
    let first = lines.next().unwrap_or("").trim();
    if lines.next().is_some() {
        return Err(ModuleError::ProtocolError(format!("expected exactly one line, got: {stdout:?}")));
    }
    if allowed.contains(&first) {
        Ok(first)
    } else {
        Err(ModuleError::ProtocolError(format!("unexpected stdout {first:?}, expected one of {allowed:?}")))
    }
}
