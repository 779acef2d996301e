use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ModuleError;
use crate::process::{self, SpawnedModule};
use crate::subcommand::SubCommand;
use crate::workdir::WorkDir;

pub struct PayloadSpec {
    pub name: String,
    pub size: Option<u64>,
}

/// Supplies the actual payload bytes for one named stream; implemented by
/// whatever already holds the artifact reader (fed, in turn, by the
/// resumable downloader).
#[async_trait]
pub trait PayloadWriter {
    async fn write_payload(
        &mut self,
        name: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), ModuleError>;
}

fn create_fifo(path: &Path) -> Result<(), ModuleError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    #[cfg(unix)]
    nix::unistd::mkfifo(path, nix::sys::stat::Mode::S_IRUSR | nix::sys::stat::Mode::S_IWUSR)
        .map_err(|e| ModuleError::Io(e.to_string()))?;
    Ok(())
}

async fn open_fifo_for_write(path: &Path) -> Result<tokio::fs::File, ModuleError> {
    tokio::fs::OpenOptions::new().write(true).open(path).await.map_err(ModuleError::from)
}

/// Opens `path` for write and writes `content` to it, but races the open
/// against the module exiting first. Used for every write the runner makes
/// into a FIFO the module is expected to read -- a module that exits (zero
/// or non-zero) before ever opening its end must never be left blocking a
/// runner write until the per-invocation timeout fires.
async fn write_racing_exit(
    child: &mut tokio::process::Child,
    path: &Path,
    content: &[u8],
) -> Result<Option<std::process::ExitStatus>, ModuleError> {
    tokio::select! {
        opened = open_fifo_for_write(path) => {
            let mut f = opened?;
            f.write_all(content).await?;
            f.shutdown().await.ok();
            Ok(None)
        }
        status = child.wait() => Ok(Some(status?)),
    }
}

/// Drives the `Download`/`DownloadWithFileSizes` FIFO streaming
/// sub-protocol end to end: spawns the module, writes the `stream-next`
/// name (and, in file-sizes mode, its size) for each payload only after the
/// corresponding `streams/<name>` FIFO exists on disk, then races opening
/// that FIFO against the module exiting. A module that opens it gets the
/// payload streamed through the pipe as usual; a module that exits 0
/// without ever opening it gets the payload spooled into `files/<name>`
/// instead, per the protocol's file-based fallback, so later lifecycle
/// steps can still reach the payload data.
///
/// `always_persist_to_disk` additionally forces the `files/<name>` copy even
/// when the module does consume the FIFO -- the legacy rootfs-image module
/// expects that file present on a later `ArtifactVerifyReboot` invocation,
/// which may run in a fresh process after a spontaneous reboot with no
/// runner left alive to feed a pipe.
pub async fn run_download(
    module_path: &Path,
    work_dir: &WorkDir,
    with_file_sizes: bool,
    payloads: &[PayloadSpec],
    writer: &mut dyn PayloadWriter,
    timeout: Duration,
    always_persist_to_disk: bool,
) -> Result<(), ModuleError> {
    let sub_command = if with_file_sizes { SubCommand::DownloadWithFileSizes } else { SubCommand::Download };
    let stream_next_path = work_dir.stream_next_path();
    create_fifo(&stream_next_path)?;

    let SpawnedModule { mut child } = process::spawn(module_path, sub_command, work_dir.root())?;

    let run = async {
        for payload in payloads {
            let stream_path = work_dir.stream_path(&payload.name);
            create_fifo(&stream_path)?;

            let line = match (with_file_sizes, payload.size) {
                (true, Some(size)) => format!("{} {}\n", payload.name, size),
                _ => format!("{}\n", payload.name),
            };

            if always_persist_to_disk {
                let fallback_path = work_dir.fallback_file_path(&payload.name);
                {
                    let mut file = tokio::fs::File::create(&fallback_path).await?;
                    writer.write_payload(&payload.name, &mut file).await?;
                }

                if let Some(status) = write_racing_exit(&mut child, &stream_next_path, line.as_bytes()).await? {
                    if !status.success() {
                        return Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)));
                    }
                    continue;
                }
                tokio::select! {
                    opened = open_fifo_for_write(&stream_path) => {
                        let mut sink = opened?;
                        let mut mirror = tokio::fs::File::open(&fallback_path).await?;
                        let copy_result = tokio::io::copy(&mut mirror, &mut sink).await;
                        sink.shutdown().await.ok();
                        copy_result?;
                    }
                    status = child.wait() => {
                        let status = status?;
                        if !status.success() {
                            return Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)));
                        }
                    }
                }
                continue;
            }

            if let Some(status) = write_racing_exit(&mut child, &stream_next_path, line.as_bytes()).await? {
                if !status.success() {
                    return Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)));
                }
                // Exited 0 without even picking up this payload's name; it
                // never can open the stream either, so spool straight to disk.
                let fallback_path = work_dir.fallback_file_path(&payload.name);
                let mut file = tokio::fs::File::create(&fallback_path).await?;
                writer.write_payload(&payload.name, &mut file).await?;
                continue;
            }

            tokio::select! {
                opened = open_fifo_for_write(&stream_path) => {
                    let mut sink = opened?;
                    let write_result = writer.write_payload(&payload.name, &mut sink).await;
                    sink.shutdown().await.ok();
                    write_result?;
                }
                status = child.wait() => {
                    let status = status?;
                    if !status.success() {
                        return Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)));
                    }
                    let fallback_path = work_dir.fallback_file_path(&payload.name);
                    let mut file = tokio::fs::File::create(&fallback_path).await?;
                    writer.write_payload(&payload.name, &mut file).await?;
                }
            }
        }

        // An empty line signals end of stream; a module that has already
        // exited obviously isn't going to read it.
        if let Some(status) = write_racing_exit(&mut child, &stream_next_path, b"\n").await? {
            if !status.success() {
                return Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)));
            }
        }
        Ok::<(), ModuleError>(())
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(())) => match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1))),
            _ => {
                let _ = child.start_kill();
                Err(ModuleError::TimedOut)
            }
        },
        Ok(Err(e)) => {
            // A concurrent non-zero exit is the more informative failure
            // than the broken-pipe symptom it caused.
            match child.try_wait() {
                Ok(Some(status)) if !status.success() => {
                    Err(ModuleError::NonZeroExitStatus(status.code().unwrap_or(-1)))
                }
                _ => Err(e),
            }
        }
        Err(_elapsed) => {
            let _ = child.start_kill();
            Err(ModuleError::TimedOut)
        }
    }
}
